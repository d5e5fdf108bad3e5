// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gridstage CLI - load a scene file into the viewer core and print a JSON
//! report of storeys, alignment, grid, area queries, erection zones and stage
//! playback.
//!
//! Usage:
//!   gridstage <scene.json> [options]

mod scene_file;

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use gridstage_core::{ElementCategory, SelectionRect};
use gridstage_engine::{EngineConfig, Viewer};
use serde_json::json;

use scene_file::SceneFile;

struct Options {
    scene: PathBuf,
    stage: Option<usize>,
    area: Option<SelectionRect>,
    categories: Vec<ElementCategory>,
    include_footings: bool,
    cells: Vec<(f64, f64)>,
    auto_stages: bool,
    dump_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,gridstage=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }
    let options = parse_options(&args)?;

    let config = EngineConfig::from_env();
    if options.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let scene = SceneFile::read(&options.scene).await?;
    let (mut source, data) = scene.into_parts();

    let mut viewer = Viewer::new(config)?;
    viewer.set_grid_axes(data.grid_axes.clone());
    let load = viewer
        .load(&mut source)
        .await
        .with_context(|| format!("loading {}", options.scene.display()))?;

    let mut report = json!({
        "load": load,
        "storeys": viewer.get_storeys(),
        "orientation": viewer.orientation(),
        "grid": {
            "virtual": viewer.grid_is_virtual(),
            "lines": viewer.grid_lines(),
        },
    });

    if !options.cells.is_empty() {
        let cells: Vec<_> = options
            .cells
            .iter()
            .map(|&(x, z)| {
                let cell = viewer.grid().and_then(|g| {
                    let cell = g.world_point_to_cell(x, z)?;
                    let (row, col) = g.cell_tags(cell)?;
                    Some(json!({
                        "row": row,
                        "column": col,
                        "rowIndex": cell.row,
                        "rowDisplayIndex": g.display_row_index(cell.row),
                        "columnIndex": cell.col,
                    }))
                });
                json!({ "x": x, "z": z, "cell": cell })
            })
            .collect();
        report["cells"] = json!(cells);
    }

    if let Some(area) = &options.area {
        viewer.set_applied_selection(Some(area.clone()));
        let ids = viewer.elements_in_area(area, &options.categories)?;
        report["area"] = json!({
            "selection": area.to_string(),
            "overlay": viewer.selection_overlays()[1],
            "elementIds": ids,
        });
    }

    let mut stages = data.stages.clone();
    if !data.sequences.is_empty() {
        stages.extend(viewer.generate_sequence_stages(&data.sequences, options.include_footings)?);
    }
    if options.auto_stages {
        let zones = viewer.detect_zones()?;
        stages.extend(viewer.generate_auto_stages(&zones, options.include_footings)?);
        report["zones"] = json!(zones);
    }
    if !stages.is_empty() {
        report["stages"] = json!(stages);
    }

    if let Some(index) = options.stage {
        if stages.is_empty() {
            bail!("--stage given but the scene defines no stages or sequences");
        }
        let section = data.section_for(&stages);
        let playback = viewer.play_stage(&section, &stages, index)?;
        let visible = viewer
            .scene()
            .map(|s| s.iter().filter(|p| p.visible).count())
            .unwrap_or(0);
        report["playback"] = json!({
            "report": playback,
            "visibleElements": visible,
        });
    }

    tracing::debug!(stages = stages.len(), "Report ready");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options {
        scene: PathBuf::from(&args[1]),
        stage: None,
        area: None,
        categories: Vec::new(),
        include_footings: true,
        cells: Vec::new(),
        auto_stages: false,
        dump_config: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--stage" => {
                let stage = value(args, &mut i)?;
                options.stage = Some(stage.parse().context("invalid --stage value")?);
            }
            "--area" => {
                options.area = Some(parse_area(value(args, &mut i)?)?);
            }
            "--category" => {
                options.categories.push(parse_category(value(args, &mut i)?)?);
            }
            "--cell" => {
                options.cells.push(parse_point(value(args, &mut i)?)?);
            }
            "--auto-stages" => {
                options.auto_stages = true;
            }
            "--no-footings" => {
                options.include_footings = false;
            }
            "--dump-config" => {
                options.dump_config = true;
            }
            other => {
                print_usage();
                bail!("unknown option: {}", other);
            }
        }
        i += 1;
    }
    Ok(options)
}

fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} needs a value", flag))
}

/// `ROW0:ROW1:COL0:COL1`
fn parse_area(text: &str) -> Result<SelectionRect> {
    let parts: Vec<&str> = text.split(':').map(str::trim).collect();
    match parts.as_slice() {
        [r0, r1, c0, c1] => Ok(SelectionRect::new(*r0, *r1, *c0, *c1)),
        [r, c] => Ok(SelectionRect::cell(*r, *c)),
        _ => bail!("invalid --area {:?}, expected ROW0:ROW1:COL0:COL1 or ROW:COL", text),
    }
}

fn parse_category(text: &str) -> Result<ElementCategory> {
    ElementCategory::ERECTION_ORDER
        .into_iter()
        .find(|c| c.label().eq_ignore_ascii_case(text))
        .with_context(|| format!("unknown category {:?}", text))
}

/// `X,Z` in aligned world coordinates.
fn parse_point(text: &str) -> Result<(f64, f64)> {
    let (x, z) = text
        .split_once(',')
        .with_context(|| format!("invalid --cell {:?}, expected X,Z", text))?;
    Ok((x.trim().parse()?, z.trim().parse()?))
}

fn print_usage() {
    eprintln!("Usage: gridstage <scene.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stage <N>             Play stage N (0-based) over the section");
    eprintln!("  --area <R0:R1:C0:C1>    Query elements inside a grid rectangle");
    eprintln!("  --category <NAME>       Restrict --area to a category (repeatable)");
    eprintln!("  --cell <X,Z>            Report the grid cell under an aligned point (repeatable)");
    eprintln!("  --auto-stages           Add stages per detected zone, storey and category");
    eprintln!("  --no-footings           Skip footing stages when expanding sequences");
    eprintln!("  --dump-config           Print the effective engine config and exit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG                       Log filter (default info,gridstage=debug)");
    eprintln!("  GRIDSTAGE_STOREY_BUFFER        Storey elevation margin (default 500)");
    eprintln!("  GRIDSTAGE_ORIENTATION_SAMPLES  Orientation vertex cap (default 2000)");
    eprintln!("  GRIDSTAGE_AXIS_MARGIN          Axis culling margin (default 0.1)");
    eprintln!("  GRIDSTAGE_MAJOR_EVERY          Major grid line interval (default 5)");
    eprintln!("  GRIDSTAGE_AREA_TOLERANCE       Grid-area tolerance (default 500)");
    eprintln!("  GRIDSTAGE_VIRTUAL_GRID_SPACING Virtual grid spacing (default 10000)");
    eprintln!("  GRIDSTAGE_ZONE_SIZE            Erection zone edge length (default 30000)");
}
