use super::decorate::Decoration;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

type PlotResult = std::result::Result<(), Box<dyn std::error::Error>>;
type Coords = Cartesian2d<RangedCoordf64, RangedCoordf64>;

pub(super) const SIZE: (u32, u32) = (800, 600);

pub(super) enum Series {
    Points(Vec<(f64, f64)>),
    Cells {
        x_edges: Vec<f64>,
        y_edges: Vec<f64>,
        counts: Vec<Vec<u64>>,
    },
    /// `(x, y, y_low, y_high)`
    ErrorBars {
        label: String,
        points: Vec<(f64, f64, f64, f64)>,
    },
}

pub(super) struct Chart {
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub series: Series,
    pub decoration: Decoration,
}

pub(super) fn draw<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, chart: &Chart) -> PlotResult
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let mut ctx = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(
            chart.x_range.0..chart.x_range.1,
            chart.y_range.0..chart.y_range.1,
        )?;
    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    match &chart.series {
        Series::Points(points) => draw_points(&mut ctx, points)?,
        Series::Cells {
            x_edges,
            y_edges,
            counts,
        } => draw_cells(&mut ctx, x_edges, y_edges, counts)?,
        Series::ErrorBars { label, points } => {
            draw_error_bars(&mut ctx, label, points)?;
            ctx.configure_series_labels()
                .position(chart.decoration.legend.legend_position())
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
    }
    draw_annotations(&mut ctx, chart)?;
    root.present()?;
    Ok(())
}

fn draw_points<DB: DrawingBackend>(
    ctx: &mut ChartContext<DB, Coords>,
    points: &[(f64, f64)],
) -> PlotResult
where
    DB::ErrorType: 'static,
{
    ctx.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 2, BLUE.mix(0.5).filled())),
    )?;
    Ok(())
}

fn draw_cells<DB: DrawingBackend>(
    ctx: &mut ChartContext<DB, Coords>,
    x_edges: &[f64],
    y_edges: &[f64],
    counts: &[Vec<u64>],
) -> PlotResult
where
    DB::ErrorType: 'static,
{
    let max = counts.iter().flatten().copied().max().unwrap_or(0);
    if max == 0 {
        return Ok(());
    }
    // Shade on a log scale so sparse cells stay visible.
    let norm = ((max + 1) as f64).ln();
    let cells = counts.iter().enumerate().flat_map(|(i, column)| {
        column
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(move |(j, &c)| (i, j, c))
    });
    ctx.draw_series(cells.map(|(i, j, c)| {
        let alpha = 0.15 + 0.85 * ((c + 1) as f64).ln() / norm;
        Rectangle::new(
            [(x_edges[i], y_edges[j]), (x_edges[i + 1], y_edges[j + 1])],
            BLUE.mix(alpha).filled(),
        )
    }))?;
    Ok(())
}

fn draw_error_bars<DB: DrawingBackend>(
    ctx: &mut ChartContext<DB, Coords>,
    label: &str,
    points: &[(f64, f64, f64, f64)],
) -> PlotResult
where
    DB::ErrorType: 'static,
{
    ctx.draw_series(LineSeries::new(points.iter().map(|p| (p.0, p.1)), &BLUE))?
        .label(label)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    ctx.draw_series(
        points
            .iter()
            .map(|p| PathElement::new(vec![(p.0, p.2), (p.0, p.3)], BLUE.stroke_width(1))),
    )?;
    ctx.draw_series(points.iter().map(|p| Circle::new((p.0, p.1), 3, BLUE.filled())))?;
    Ok(())
}

fn draw_annotations<DB: DrawingBackend>(ctx: &mut ChartContext<DB, Coords>, chart: &Chart) -> PlotResult
where
    DB::ErrorType: 'static,
{
    for (location, text) in &chart.decoration.annotations {
        let at = location.data_point(chart.x_range, chart.y_range);
        let style = TextStyle::from(("sans-serif", 16).into_font()).pos(location.anchor());
        ctx.draw_series(std::iter::once(Text::new(text.clone(), at, style)))?;
    }
    Ok(())
}
