//! Dam break: a column of water collapses into a walled basin.
//!
//! Builds a 9x9 basin, stacks a 3x3 column of water in one corner and drives
//! the simulation from a fake host clock. Prints a summary after each step
//! and a height map of the basin floor at the end.
//!
//! Run with: `cargo run -p voxwater-core --example dam_break`

use voxwater_core::config::{Region, SimConfig};
use voxwater_core::coord::GridCoord;
use voxwater_core::observer::{CellObserver, CellView, Visibility};
use voxwater_core::oracle::SolidVoxels;
use voxwater_core::sim::TickDriver;
use voxwater_core::step::Simulation;

/// Counts visible cells the way a renderer would update its meshes.
#[derive(Default)]
struct MeshCounter {
    shown: usize,
    hidden: usize,
}

impl CellObserver for MeshCounter {
    fn cell_changed(&mut self, view: &CellView) {
        match view.visibility {
            Visibility::Visible => self.shown += 1,
            Visibility::Hidden => self.hidden += 1,
        }
    }

    fn cell_removed(&mut self, _coord: GridCoord) {
        self.hidden += 1;
    }
}

fn main() {
    // --- Step 1: Geometry ---

    let mut solids = SolidVoxels::new();
    solids.fill_box(GridCoord::new(-5, -1, -5), GridCoord::new(5, -1, 5));
    for y in 0..6 {
        solids.fill_box(GridCoord::new(-5, y, -5), GridCoord::new(5, y, -5));
        solids.fill_box(GridCoord::new(-5, y, 5), GridCoord::new(5, y, 5));
        solids.fill_box(GridCoord::new(-5, y, -5), GridCoord::new(-5, y, 5));
        solids.fill_box(GridCoord::new(5, y, -5), GridCoord::new(5, y, 5));
    }

    // --- Step 2: Simulation ---

    let config = SimConfig {
        tick_interval: 16,
        ..SimConfig::new(Region::new(
            GridCoord::new(-8, -2, -8),
            GridCoord::new(8, 12, 8),
        ))
    };
    let mut sim = Simulation::new(config, solids).expect("valid config");

    for x in -4..=-2 {
        for z in -4..=-2 {
            for y in 0..5 {
                sim.place_liquid(GridCoord::new(x, y, z), 6)
                    .expect("column inside region");
            }
        }
    }
    println!(
        "placed {} cells holding {} units",
        sim.cell_count(),
        sim.total_volume()
    );

    // --- Step 3: Drive from a 60 Hz host clock ---

    let mut driver = TickDriver::from_config(sim.config());
    let mut meshes = MeshCounter::default();
    for frame in 0..240 {
        let result = driver.advance(&mut sim, 1);
        for report in &result.reports {
            for &coord in &report.changed {
                if let Some(view) = sim.view(coord) {
                    meshes.cell_changed(&view);
                }
            }
            for &coord in &report.removed {
                meshes.cell_removed(coord);
            }
            println!(
                "frame {frame:3}  tick {:3}  cells {:3}  changed {:3}  idle {:3}  excess {}",
                report.tick,
                sim.cell_count(),
                report.changed.len(),
                report.idle,
                sim.excess()
            );
        }
    }

    // --- Step 4: Results ---

    println!(
        "\ntotal volume {} ({} in cells, {} pooled)",
        sim.total_volume(),
        sim.liquid_volume(),
        sim.excess()
    );
    println!("mesh updates: {} shown, {} hidden", meshes.shown, meshes.hidden);

    println!("\nfloor volumes (y = 0):");
    for z in -4..=4 {
        let row: Vec<String> = (-4..=4)
            .map(|x| {
                sim.cell(GridCoord::new(x, 0, z))
                    .map_or_else(|| "  .".to_string(), |c| format!("{:3}", c.volume))
            })
            .collect();
        println!("{}", row.join(""));
    }
}
