//! End-to-end behaviour of the step scheduler against real grids and
//! obstacle sets.

use voxwater_core::cell::CellState;
use voxwater_core::coord::{Direction, GridCoord, WorldPos};
use voxwater_core::observer::Visibility;
use voxwater_core::oracle::SolidVoxels;
use voxwater_core::sim::TickDriver;
use voxwater_core::step::Simulation;
use voxwater_core::test_utils::*;

fn at(x: i32, y: i32, z: i32) -> GridCoord {
    GridCoord::new(x, y, z)
}

fn volume_at<O: voxwater_core::oracle::ObstacleOracle>(sim: &Simulation<O>, c: GridCoord) -> Option<u32> {
    sim.cell(c).map(|r| r.volume)
}

// ===========================================================================
// Core transitions through a full step
// ===========================================================================

#[test]
fn flow_splits_over_two_open_sides() {
    let origin = at(0, 0, 0);
    let mut solids = SolidVoxels::new();
    for dir in [Direction::Back, Direction::Left, Direction::Bottom] {
        solids.insert(origin.step(dir));
    }
    let mut sim = Simulation::new(small_config(), solids).unwrap();
    sim.place_liquid(origin, 5).unwrap();

    let report = sim.step();

    let cell = sim.cell(origin).unwrap();
    assert_eq!(cell.state, CellState::Flow);
    assert_eq!(cell.volume, 1);
    assert_eq!(volume_at(&sim, at(1, 0, 0)), Some(2));
    assert_eq!(volume_at(&sim, at(0, 0, -1)), Some(2));
    assert_eq!(report.spawned, 2);
    assert_eq!(sim.total_volume(), 5);
}

#[test]
fn empty_cell_is_hidden_then_removed() {
    let mut sim = floor_sim();
    let c = at(3, 0, 3);
    sim.place_liquid(c, 0).unwrap();
    assert_eq!(sim.view(c).unwrap().visibility, Visibility::Hidden);

    let mut observer = RecordingObserver::default();
    let report = sim.step_observed(&mut observer);

    assert!(sim.cell(c).is_none());
    assert_eq!(report.spawned, 0);
    assert_eq!(observer.removed, vec![c]);
    assert!(observer.changed.is_empty());
}

#[test]
fn enclosed_source_keeps_its_emission() {
    let origin = at(0, 0, 0);
    let mut solids = SolidVoxels::new();
    for dir in Direction::FLOW_ORDER {
        solids.insert(origin.step(dir));
    }
    let mut sim = Simulation::new(small_config(), solids).unwrap();
    sim.place_source(origin).unwrap();

    for _ in 0..3 {
        let report = sim.step();
        assert_eq!(report.spawned, 0);
    }
    let src = sim.cell(origin).unwrap();
    assert_eq!(src.state, CellState::Create);
    assert_eq!(src.volume, 10);
    assert_eq!(sim.cell_count(), 1);
}

#[test]
fn open_source_emits_into_every_flow_direction() {
    let mut sim = open_sim();
    let origin = at(0, 0, 0);
    sim.place_source(origin).unwrap();

    let report = sim.step();

    // Nine units over five sides: the first four get two, the bottom one.
    assert_eq!(report.spawned, 5);
    assert_eq!(volume_at(&sim, origin), Some(10));
    assert_eq!(volume_at(&sim, at(1, 0, 0)), Some(2));
    assert_eq!(volume_at(&sim, at(0, 0, -1)), Some(2));
    assert_eq!(volume_at(&sim, at(-1, 0, 0)), Some(2));
    assert_eq!(volume_at(&sim, at(0, 0, 1)), Some(2));
    assert_eq!(volume_at(&sim, at(0, -1, 0)), Some(1));
    assert!(sim.cell(at(0, 1, 0)).is_none());
}

#[test]
fn falling_cell_moves_down_one_unit_per_step() {
    let mut sim = open_sim();
    sim.place_liquid(at(0, 5, 0), 7).unwrap();

    let report = sim.step();
    assert_eq!(report.removed, vec![at(0, 5, 0)]);
    assert_eq!(volume_at(&sim, at(0, 4, 0)), Some(7));

    run_steps(&mut sim, 12);
    assert_eq!(sim.cell_count(), 1);
    assert_eq!(volume_at(&sim, at(0, -8, 0)), Some(7));
}

#[test]
fn region_floor_stops_a_fall() {
    let mut sim = open_sim();
    let bottom = at(2, -8, 2);
    sim.place_liquid(bottom, 1).unwrap();
    sim.step();
    assert_ne!(sim.cell(bottom).unwrap().state, CellState::Fall);
    assert_eq!(volume_at(&sim, bottom), Some(1));
}

#[test]
fn region_at_the_lattice_edge_steps_safely() {
    use voxwater_core::config::{ConfigError, Region, SimConfig};
    use voxwater_core::oracle::NoObstacles;

    let touching = SimConfig::new(Region::new(at(i32::MAX - 3, 0, 0), at(i32::MAX, 3, 3)));
    assert!(matches!(
        Simulation::new(touching, NoObstacles),
        Err(ConfigError::RegionAtLatticeEdge { .. })
    ));

    let config = SimConfig::new(Region::new(at(i32::MAX - 4, 0, 0), at(i32::MAX - 1, 3, 3)));
    let mut sim = Simulation::new(config, NoObstacles).unwrap();
    sim.place_liquid(at(i32::MAX - 1, 1, 1), 8).unwrap();
    for report in run_steps(&mut sim, 10) {
        assert_eq!(report.dropped_volume, 0);
    }
    assert_eq!(sim.total_volume(), 8);
}

// ===========================================================================
// Excess pool
// ===========================================================================

#[test]
fn pressured_cell_bleeds_into_pool_until_still() {
    let mut sim = basin_sim(0, 1);
    let c = at(0, 0, 0);
    sim.place_liquid(c, 4).unwrap();

    for expected in [3, 2, 1] {
        sim.step();
        assert_eq!(sim.cell(c).unwrap().state, CellState::Pressured);
        assert_eq!(volume_at(&sim, c), Some(expected));
    }
    assert_eq!(sim.excess(), 3);

    sim.step();
    assert_eq!(sim.cell(c).unwrap().state, CellState::Still);
    assert_eq!(sim.total_volume(), 4);
}

#[test]
fn shallow_cell_draws_from_pressured_cell() {
    let mut solids = basin(0, 1);
    solids.fill_box(at(3, -1, 3), at(7, -1, 7));
    let mut sim = Simulation::new(small_config(), solids).unwrap();
    sim.place_liquid(at(0, 0, 0), 3).unwrap();
    sim.place_liquid(at(5, 0, 5), 1).unwrap();

    sim.step();

    assert_eq!(volume_at(&sim, at(0, 0, 0)), Some(2));
    assert_eq!(volume_at(&sim, at(5, 0, 5)), Some(2));
    assert_eq!(sim.excess(), 0);
}

// ===========================================================================
// Sinks
// ===========================================================================

#[test]
fn sink_drains_what_flows_into_it() {
    let cell = at(0, -7, 0);
    let mut solids = SolidVoxels::new();
    for dir in [Direction::Front, Direction::Back, Direction::Left, Direction::Right] {
        solids.insert(cell.step(dir));
    }
    let mut sim = Simulation::new(small_config(), solids).unwrap();
    let sink = at(0, -8, 0);
    sim.place_sink(sink).unwrap();
    sim.place_liquid(cell, 5).unwrap();

    let first = sim.step();
    assert_eq!(first.discarded, 0);
    assert_eq!(volume_at(&sim, sink), Some(4));
    assert_eq!(volume_at(&sim, cell), Some(1));

    let second = sim.step();
    assert_eq!(second.discarded, 4);
    assert_eq!(volume_at(&sim, sink), Some(0));
    assert_eq!(sim.cell(sink).unwrap().state, CellState::Destroy);
    assert_eq!(sim.liquid_volume(), 1);
}

// ===========================================================================
// Idle and change reporting
// ===========================================================================

#[test]
fn still_cell_goes_idle() {
    let mut sim = basin_sim(0, 1);
    let c = at(0, 0, 0);
    sim.place_liquid(c, 1).unwrap();

    let first = sim.step();
    assert_eq!(first.changed, vec![c]);
    assert_eq!(first.idle, 0);

    let second = sim.step();
    assert!(second.changed.is_empty());
    assert_eq!(second.idle, 1);
    assert_eq!(sim.cell(c).unwrap().state, CellState::Still);
}

#[test]
fn observer_receives_world_positions() {
    let mut sim = open_sim();
    sim.place_liquid(at(1, 2, 3), 4).unwrap();
    let mut observer = RecordingObserver::default();
    sim.step_observed(&mut observer);

    assert_eq!(observer.removed, vec![at(1, 2, 3)]);
    assert_eq!(observer.changed.len(), 1);
    let view = observer.changed[0];
    assert_eq!(view.coord, at(1, 1, 3));
    assert_eq!(view.world, WorldPos::new(fixed(1.0), fixed(1.0), fixed(3.0)));
    assert_eq!(view.visibility, Visibility::Visible);
}

// ===========================================================================
// Conservation and determinism
// ===========================================================================

#[test]
fn basin_conserves_volume_over_many_steps() {
    let mut sim = basin_sim(3, 4);
    place_column(&mut sim, at(0, 0, 0), 6, 5);
    place_column(&mut sim, at(2, 2, -1), 3, 9);
    let total = sim.total_volume();

    for report in run_steps(&mut sim, 200) {
        assert_eq!(report.dropped_volume, 0);
        assert_eq!(sim.total_volume(), total);
    }
    assert!(sim.grid().iter().all(|c| c.volume > 0));
}

#[test]
fn identical_worlds_stay_identical() {
    let build = || {
        let mut sim = basin_sim(4, 3);
        scatter(&mut sim, 7, 60, 6);
        sim
    };
    let mut a = build();
    let mut b = build();
    for _ in 0..50 {
        a.step();
        b.step();
        assert_eq!(a.state_hash(), b.state_hash());
    }
}

// ===========================================================================
// Host interop
// ===========================================================================

#[test]
fn tick_driver_paces_steps() {
    let mut sim = open_sim();
    sim.place_liquid(at(0, 0, 0), 3).unwrap();
    let mut driver = TickDriver::from_config(sim.config());

    assert_eq!(driver.advance(&mut sim, 30).steps_run, 0);
    let result = driver.advance(&mut sim, 80);
    assert_eq!(result.steps_run, 2);
    assert_eq!(sim.tick(), 2);
    assert_eq!(volume_at(&sim, at(0, -2, 0)), Some(3));
}

#[test]
fn world_positions_map_to_cells() {
    let sim = open_sim();
    let pos = WorldPos::new(fixed(0.5), fixed(-0.25), fixed(7.9));
    assert_eq!(sim.world_to_coord(pos), Ok(at(0, -1, 7)));
    let outside = WorldPos::new(fixed(100.0), fixed(0.0), fixed(0.0));
    assert!(sim.world_to_coord(outside).is_err());
}

#[test]
fn oracle_changes_apply_next_step() {
    let mut sim = floor_sim();
    sim.place_liquid(at(0, 0, 0), 1).unwrap();
    sim.step();
    assert_eq!(sim.cell(at(0, 0, 0)).unwrap().state, CellState::Shallow);

    sim.oracle_mut().remove(at(0, -1, 0));
    sim.step();
    assert_eq!(volume_at(&sim, at(0, -1, 0)), Some(1));
    assert!(sim.cell(at(0, 0, 0)).is_none());
}
