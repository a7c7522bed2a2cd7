use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use svg2pdf::usvg;

use crate::scores::{ENSEMBLE_MODEL_ID, ScoreRecord};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 1400;
const GROUP_WIDTH_PX: u32 = 72;

// Registered for bitmap text and loaded into the PDF font database.
static FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const FONT_FAMILY: &str = "DejaVu Sans";

// seaborn "Set3"
const PALETTE: [RGBColor; 12] = [
    RGBColor(141, 211, 199),
    RGBColor(255, 255, 179),
    RGBColor(190, 186, 218),
    RGBColor(251, 128, 114),
    RGBColor(128, 177, 211),
    RGBColor(253, 180, 98),
    RGBColor(179, 222, 105),
    RGBColor(252, 205, 229),
    RGBColor(217, 217, 217),
    RGBColor(188, 128, 189),
    RGBColor(204, 235, 197),
    RGBColor(255, 237, 111),
];

/// Models in plot order: alphabetical, the ensemble last.
pub fn model_order(records: &[ScoreRecord]) -> Vec<String> {
    let mut models: Vec<String> = records
        .iter()
        .map(|r| r.model_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if let Some(pos) = models.iter().position(|m| m == ENSEMBLE_MODEL_ID) {
        let ensemble = models.remove(pos);
        models.push(ensemble);
    }
    models
}

struct BoxplotData {
    models: Vec<String>,
    labels: Vec<String>,
    scores: BTreeMap<(String, String), Vec<f64>>,
}

impl BoxplotData {
    fn from_records(records: &[ScoreRecord]) -> Self {
        let labels = records
            .iter()
            .map(|r| r.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut scores: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
        for r in records.iter().filter(|r| r.score.0.is_finite()) {
            scores
                .entry((r.model_id.clone(), r.label.clone()))
                .or_default()
                .push(r.score.0);
        }
        Self {
            models: model_order(records),
            labels,
            scores,
        }
    }
}

/// Box plot of Dice scores, one group per model and one box per label,
/// written as PNG and PDF.
pub fn render_boxplot(png_path: &Path, pdf_path: &Path, records: &[ScoreRecord]) -> Result<()> {
    register_font("sans-serif", FontStyle::Normal, FONT)
        .map_err(|_| anyhow!("embedded plot font is not a valid font"))?;
    let data = BoxplotData::from_records(records);

    draw(
        BitMapBackend::new(png_path, (WIDTH, HEIGHT)).into_drawing_area(),
        &data,
    )
    .with_context(|| format!("failed to render {}", png_path.display()))?;

    let mut svg = String::new();
    draw(
        SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area(),
        &data,
    )?;
    write_pdf(pdf_path, &svg)
}

fn draw<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, data: &BoxplotData) -> Result<()> {
    root.fill(&WHITE).map_err(|e| anyhow!("plot: {e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Dice", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(160)
        .y_label_area_size(60)
        .build_cartesian_2d(data.models[..].into_segmented(), 0.0f32..1.05f32)
        .map_err(|e| anyhow!("plot: {e}"))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Model")
        .y_desc("Dice")
        .x_label_formatter(&|v| match v {
            SegmentValue::Exact(m) | SegmentValue::CenterOf(m) => m.to_string(),
            SegmentValue::Last => String::new(),
        })
        .draw()
        .map_err(|e| anyhow!("plot: {e}"))?;

    let n_labels = data.labels.len().max(1) as u32;
    let box_width = (GROUP_WIDTH_PX / n_labels).max(6);
    for (i, label) in data.labels.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let offset = (i as f64 - (n_labels as f64 - 1.0) / 2.0) * (box_width as f64 + 2.0);
        let boxes: Vec<_> = data
            .models
            .iter()
            .filter_map(|model| {
                let values = data.scores.get(&(model.clone(), label.clone()))?;
                let quartiles = Quartiles::new(values.as_slice());
                Some(
                    Boxplot::new_vertical(SegmentValue::CenterOf(model), &quartiles)
                        .width(box_width)
                        .whisker_width(0.5)
                        .offset(offset)
                        .style(color.stroke_width(2)),
                )
            })
            .collect();
        chart
            .draw_series(boxes)
            .map_err(|e| anyhow!("plot: {e}"))?
            .label(label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| anyhow!("plot: {e}"))?;

    root.present().map_err(|e| anyhow!("plot: {e}"))?;
    Ok(())
}

fn write_pdf(path: &Path, svg: &str) -> Result<()> {
    let mut options = usvg::Options::default();
    options.font_family = FONT_FAMILY.to_string();
    let fontdb = options.fontdb_mut();
    fontdb.load_font_data(FONT.to_vec());
    fontdb.set_sans_serif_family(FONT_FAMILY);

    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| anyhow!("plot svg: {e}"))?;
    let pdf = svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| anyhow!("failed to convert plot to PDF: {e:?}"))?;
    fs::write(path, pdf).with_context(|| format!("failed to write {}", path.display()))
}
