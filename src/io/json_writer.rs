use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::ctx::Ctx;
use crate::scores::ScoreTables;

const INDENT: &[u8] = b"    ";

pub fn build_tables(ctx: &Ctx) -> ScoreTables {
    ctx.evaluation.tables()
}

/// Pretty JSON with a four-space indent; map keys come out sorted.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut ser =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(INDENT));
    value
        .serialize(&mut ser)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn write_tables(ctx: &Ctx, tables: &ScoreTables) -> Result<()> {
    write_json(&ctx.output.case_json_path, &tables.case_based)?;
    write_json(&ctx.output.model_json_path, &tables.model_based)?;
    Ok(())
}
