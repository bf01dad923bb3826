use tactics_grid_core::{
    CellCoord, CellLabel, GridConfig, GridSettings, ObstacleType, Team, TerrainKind, UnitId,
    UnitSize, WorldPoint, AGGRESSION_BASELINE, EMPTY_CELL_CODE,
};
use tactics_grid_world::{grid_math, AggressionMatrix, OccupancyGrid};

fn open_grid(size: u32) -> OccupancyGrid {
    let config = GridConfig::new(size, 4, 6).expect("valid config");
    OccupancyGrid::with_terrain(&config, TerrainKind::Normal)
}

fn settings_for(size: u32) -> GridSettings {
    GridSettings::new(size, 1.0, 0.0, 0.0)
}

fn block(x: u32, y: u32) -> [CellCoord; 4] {
    [
        CellCoord::new(x, y),
        CellCoord::new(x + 1, y),
        CellCoord::new(x, y + 1),
        CellCoord::new(x + 1, y + 1),
    ]
}

fn assert_at_baseline(matrix: &AggressionMatrix) {
    assert!(
        matrix.iter().all(|value| value == AGGRESSION_BASELINE),
        "aggression matrix drifted from baseline"
    );
}

#[test]
fn aggression_starts_at_baseline_for_both_teams() {
    let grid = open_grid(12);
    for team in Team::ALL {
        let matrix = grid.aggression_for_team(team);
        assert_eq!(matrix.size(), 12);
        assert_at_baseline(matrix);
    }
}

#[test]
fn simple_occupy_and_query() {
    let mut grid = open_grid(10);
    let cell = CellCoord::new(5, 5);

    assert!(grid.occupy_cell(cell, UnitId::new(1), Team::Lower, 0));
    assert_eq!(grid.occupant(cell), Some(UnitId::new(1)));
    assert!(!grid.occupy_cell(cell, UnitId::new(2), Team::Upper, 0));
    assert_eq!(grid.occupant(cell), Some(UnitId::new(1)));
    assert_eq!(grid.footprint(UnitId::new(2)), None);
}

#[test]
fn ranged_occupant_raises_its_neighbourhood() {
    let mut grid = open_grid(10);
    let anchor = CellCoord::new(5, 5);
    assert!(grid.occupy_cell(anchor, UnitId::new(1), Team::Lower, 1));

    let matrix = grid.aggression_for_team(Team::Lower);
    for (x, y) in [
        (4, 5),
        (6, 5),
        (5, 4),
        (5, 6),
        (4, 4),
        (6, 6),
        (4, 6),
        (6, 4),
    ] {
        assert_eq!(
            matrix.get(CellCoord::new(x, y)),
            Some(AGGRESSION_BASELINE + 1),
            "cell ({x}, {y}) should be threatened"
        );
    }
    assert_eq!(matrix.get(anchor), Some(AGGRESSION_BASELINE));
    for (x, y) in [(3, 5), (7, 5), (5, 3), (5, 7), (3, 3), (7, 7)] {
        assert_eq!(matrix.get(CellCoord::new(x, y)), Some(AGGRESSION_BASELINE));
    }
    assert_at_baseline(grid.aggression_for_team(Team::Upper));
}

#[test]
fn release_restores_baseline() {
    let mut grid = open_grid(10);
    let anchor = CellCoord::new(5, 5);
    let unit = UnitId::new(1);
    assert!(grid.occupy_cell(anchor, unit, Team::Lower, 1));

    assert!(grid.cleanup_all(unit, 1, UnitSize::Small));

    assert_at_baseline(grid.aggression_for_team(Team::Lower));
    assert_eq!(grid.occupant(anchor), None);
    assert_eq!(grid.team_of(unit), None);
    assert!(!grid.cleanup_all(unit, 1, UnitSize::Small));
}

#[test]
fn unarmed_occupant_projects_no_threat() {
    let mut grid = open_grid(8);
    assert!(grid.occupy_cell(CellCoord::new(3, 3), UnitId::new(1), Team::Upper, 0));
    assert_at_baseline(grid.aggression_for_team(Team::Upper));
}

#[test]
fn moving_a_small_unit_moves_its_threat() {
    let mut grid = open_grid(10);
    let unit = UnitId::new(3);
    assert!(grid.occupy_cell(CellCoord::new(2, 2), unit, Team::Lower, 1));
    assert!(grid.occupy_cell(CellCoord::new(7, 7), unit, Team::Lower, 1));

    let matrix = grid.aggression_for_team(Team::Lower);
    assert!(!matrix.is_threatened(CellCoord::new(1, 1)));
    assert!(matrix.is_threatened(CellCoord::new(8, 8)));
    assert_eq!(grid.occupant(CellCoord::new(2, 2)), None);
    assert_eq!(grid.footprint(unit), Some(&[CellCoord::new(7, 7)][..]));
}

#[test]
fn moving_with_a_different_range_withdraws_the_placed_threat() {
    let mut grid = open_grid(10);
    let unit = UnitId::new(3);
    assert!(grid.occupy_cell(CellCoord::new(2, 2), unit, Team::Lower, 1));
    assert!(grid.occupy_cell(CellCoord::new(7, 7), unit, Team::Lower, 0));
    assert_at_baseline(grid.aggression_for_team(Team::Lower));

    assert!(grid.occupy_cell(CellCoord::new(4, 4), unit, Team::Lower, 2));
    assert!(grid
        .aggression_for_team(Team::Lower)
        .is_threatened(CellCoord::new(5, 5)));

    assert!(grid.cleanup_all(unit, 0, UnitSize::Small));
    assert_at_baseline(grid.aggression_for_team(Team::Lower));
}

#[test]
fn large_unit_disarmed_while_moving_leaves_no_threat() {
    let mut grid = open_grid(10);
    let unit = UnitId::new(8);
    assert!(grid.occupy_cells(&block(2, 2), unit, Team::Upper, 1));
    assert!(grid.occupy_cells(&block(5, 5), unit, Team::Upper, 0));
    assert_at_baseline(grid.aggression_for_team(Team::Upper));

    assert!(grid.cleanup_all(unit, 0, UnitSize::Large));
    assert_at_baseline(grid.aggression_for_team(Team::Upper));
}

#[test]
fn reoccupying_the_same_cell_is_idempotent() {
    let mut grid = open_grid(10);
    let unit = UnitId::new(3);
    assert!(grid.occupy_cell(CellCoord::new(4, 4), unit, Team::Upper, 2));
    let before = grid.aggression_for_team(Team::Upper).clone();

    assert!(grid.occupy_cell(CellCoord::new(4, 4), unit, Team::Upper, 2));

    assert_eq!(grid.aggression_for_team(Team::Upper), &before);
}

#[test]
fn rejected_occupy_leaves_state_untouched() {
    let mut grid = open_grid(10);
    let holder = UnitId::new(1);
    let intruder = UnitId::new(2);
    assert!(grid.occupy_cell(CellCoord::new(2, 2), holder, Team::Lower, 1));
    assert!(grid.occupy_cell(CellCoord::new(6, 6), intruder, Team::Upper, 1));
    let lower = grid.aggression_for_team(Team::Lower).clone();
    let upper = grid.aggression_for_team(Team::Upper).clone();
    let snapshot = grid.matrix();

    assert!(!grid.occupy_cell(CellCoord::new(2, 2), intruder, Team::Upper, 1));

    assert_eq!(grid.aggression_for_team(Team::Lower), &lower);
    assert_eq!(grid.aggression_for_team(Team::Upper), &upper);
    assert_eq!(grid.matrix(), snapshot);
    assert_eq!(grid.footprint(intruder), Some(&[CellCoord::new(6, 6)][..]));
}

#[test]
fn off_board_cells_are_rejected_without_panicking() {
    let mut grid = open_grid(6);
    assert!(!grid.occupy_cell(CellCoord::new(6, 0), UnitId::new(1), Team::Lower, 1));
    assert!(!grid.occupy_cells(&block(5, 5), UnitId::new(2), Team::Lower, 1));
    assert_eq!(grid.occupant(CellCoord::new(60, 60)), None);
    assert_eq!(grid.label(CellCoord::new(60, 60)), None);
    assert!(!grid.occupy_by_hole(&settings_for(6), CellCoord::new(6, 6)));
}

#[test]
fn large_unit_threat_rings_its_footprint() {
    let mut grid = open_grid(10);
    let unit = UnitId::new(9);
    assert!(grid.occupy_cells(&block(4, 4), unit, Team::Upper, 1));

    let matrix = grid.aggression_for_team(Team::Upper);
    let mut raised = 0;
    for value in matrix.iter() {
        assert!(value == AGGRESSION_BASELINE || value == AGGRESSION_BASELINE + 1);
        if value > AGGRESSION_BASELINE {
            raised += 1;
        }
    }
    assert_eq!(raised, 12);
    for cell in block(4, 4) {
        assert_eq!(grid.occupant(cell), Some(unit));
        assert!(!matrix.is_threatened(cell));
    }
    assert!(matrix.is_threatened(CellCoord::new(3, 3)));
    assert!(matrix.is_threatened(CellCoord::new(6, 6)));
    assert!(matrix.is_threatened(CellCoord::new(3, 6)));
}

#[test]
fn large_unit_release_restores_baseline() {
    let mut grid = open_grid(10);
    let unit = UnitId::new(9);
    assert!(grid.occupy_cells(&block(0, 0), unit, Team::Lower, 1));
    assert!(grid.occupy_cells(&block(1, 0), unit, Team::Lower, 1));
    assert_eq!(grid.occupant(CellCoord::new(0, 0)), None);
    assert_eq!(grid.occupant(CellCoord::new(2, 1)), Some(unit));

    assert!(grid.cleanup_all(unit, 1, UnitSize::Large));

    assert_at_baseline(grid.aggression_for_team(Team::Lower));
    assert!(grid.are_all_cells_empty(&block(0, 0), None));
    assert!(grid.are_all_cells_empty(&block(1, 0), None));
}

#[test]
fn occupy_cells_rejects_malformed_requests() {
    let mut grid = open_grid(10);
    let unit = UnitId::new(5);

    assert!(!grid.occupy_cells(&[], unit, Team::Lower, 1));
    assert!(!grid.occupy_cells(
        &[CellCoord::new(1, 1), CellCoord::new(1, 1), CellCoord::new(2, 1)],
        unit,
        Team::Lower,
        1
    ));

    assert!(grid.occupy_cells(&block(2, 2), unit, Team::Lower, 1));
    assert!(
        !grid.occupy_cells(&block(2, 2), unit, Team::Lower, 1),
        "every requested cell is already taken"
    );

    assert!(grid.occupy_cell(CellCoord::new(5, 3), UnitId::new(6), Team::Upper, 0));
    assert!(
        !grid.occupy_cells(&block(4, 2), UnitId::new(7), Team::Upper, 0),
        "footprint overlaps another unit"
    );
    assert_eq!(grid.occupant(CellCoord::new(4, 2)), None);
}

#[test]
fn footprint_shapes_cannot_be_mixed() {
    let mut grid = open_grid(10);
    let small = UnitId::new(1);
    let large = UnitId::new(2);

    assert!(grid.occupy_cell(CellCoord::new(0, 0), small, Team::Lower, 1));
    assert!(!grid.occupy_cells(&block(5, 5), small, Team::Lower, 1));

    assert!(grid.occupy_cells(&block(2, 2), large, Team::Upper, 1));
    assert!(!grid.occupy_cell(CellCoord::new(8, 8), large, Team::Upper, 1));

    assert!(grid.cleanup_all(small, 1, UnitSize::Small));
    assert!(grid.occupy_cells(&block(5, 5), small, Team::Lower, 1));
}

#[test]
fn obstacles_block_placement_and_report_codes() {
    let config = GridConfig::new(20, 4, 6).expect("valid config");
    let mut grid = OccupancyGrid::with_terrain(&config, TerrainKind::LavaCenter);
    let center = grid.center_region();
    let inside = CellCoord::new(center.start(), center.start());

    assert_eq!(
        grid.label(inside),
        Some(CellLabel::Obstacle(ObstacleType::Lava))
    );
    assert!(!grid.occupy_cell(inside, UnitId::new(1), Team::Lower, 0));
    assert!(!grid.are_all_cells_empty(&[inside], None));
    let row = usize::try_from(inside.y()).expect("row index");
    let column = usize::try_from(inside.x()).expect("column index");
    assert_eq!(grid.matrix()[row][column], ObstacleType::Lava.numeric());
}

#[test]
fn block_terrain_stays_inside_the_center_region() {
    let config = GridConfig::new(20, 4, 6).expect("valid config");
    let grid = OccupancyGrid::with_terrain(&config, TerrainKind::BlockCenter);
    let center = grid.center_region();
    let block_code = ObstacleType::Block.numeric();

    let mut blocks = 0;
    for (y, row) in grid.matrix().iter().enumerate() {
        for (x, code) in row.iter().enumerate() {
            if *code != block_code {
                continue;
            }
            blocks += 1;
            let cell = CellCoord::new(
                u32::try_from(x).expect("column"),
                u32::try_from(y).expect("row"),
            );
            assert!(center.contains(cell), "block outside center at {cell:?}");
        }
    }
    assert_eq!(blocks, 100);
    assert_eq!(grid.laps_until_narrowing(), 4);
}

#[test]
fn normal_terrain_is_obstacle_free() {
    let grid = open_grid(16);
    assert!(grid
        .matrix()
        .iter()
        .flatten()
        .all(|code| *code == EMPTY_CELL_CODE));
    assert_eq!(grid.laps_until_narrowing(), 6);
}

#[test]
fn matrix_reports_team_numbers_for_occupants_and_claims() {
    let mut grid = open_grid(8);
    assert!(grid.occupy_cell(CellCoord::new(1, 2), UnitId::new(1), Team::Lower, 0));
    let contests = grid.target_to_cell(
        UnitId::new(2),
        Team::Upper,
        Some(CellCoord::new(7, 7)),
        Some(CellCoord::new(6, 7)),
    );
    assert!(contests.is_empty());

    let matrix = grid.matrix();
    assert_eq!(matrix[2][1], Team::Lower.number());
    assert_eq!(matrix[7][6], Team::Upper.number());
    assert_eq!(matrix[0][0], EMPTY_CELL_CODE);
}

#[test]
fn are_all_cells_empty_honours_the_exclusion() {
    let mut grid = open_grid(8);
    let unit = UnitId::new(4);
    assert!(grid.occupy_cells(&block(1, 1), unit, Team::Lower, 0));

    assert!(!grid.are_all_cells_empty(&block(2, 2), None));
    assert!(grid.are_all_cells_empty(&block(2, 2), Some(unit)));
    assert!(!grid.are_all_cells_empty(&block(2, 2), Some(UnitId::new(5))));
    assert!(grid.are_all_cells_empty(&[CellCoord::new(30, 30)], None));
}

#[test]
fn melee_threat_is_reported_only_above_baseline() {
    let mut grid = open_grid(10);
    let settings = settings_for(10);
    let attacker = UnitId::new(1);
    let defender = UnitId::new(2);
    assert!(grid.occupy_cell(CellCoord::new(5, 5), attacker, Team::Lower, 1));
    assert!(grid.occupy_cell(CellCoord::new(6, 6), defender, Team::Upper, 1));

    let adjacent = grid_math::cell_center(&settings, CellCoord::new(6, 6));
    let distant = grid_math::cell_center(&settings, CellCoord::new(8, 8));
    assert!(grid.can_be_attacked_by_melee(adjacent, defender, UnitSize::Small, &settings));
    assert!(!grid.can_be_attacked_by_melee(distant, defender, UnitSize::Small, &settings));

    assert!(grid.cleanup_all(attacker, 1, UnitSize::Small));
    assert!(!grid.can_be_attacked_by_melee(adjacent, defender, UnitSize::Small, &settings));
}

#[test]
fn melee_threat_checks_every_cell_of_a_large_unit() {
    let mut grid = open_grid(10);
    let settings = settings_for(10);
    let giant = UnitId::new(1);
    let archer = UnitId::new(2);
    assert!(grid.occupy_cells(&block(2, 2), giant, Team::Upper, 1));
    assert!(grid.occupy_cell(CellCoord::new(4, 4), archer, Team::Lower, 1));

    let vertex = WorldPoint::new(3.0, 3.0);
    let far_corner = WorldPoint::new(2.5, 2.5);
    assert!(grid.can_be_attacked_by_melee(vertex, giant, UnitSize::Large, &settings));
    assert!(!grid.can_be_attacked_by_melee(far_corner, giant, UnitSize::Small, &settings));
    assert!(!grid.can_be_attacked_by_melee(
        vertex,
        UnitId::new(99),
        UnitSize::Large,
        &settings
    ));
}

#[test]
fn enemy_aggression_follows_the_units_team() {
    let mut grid = open_grid(6);
    let unit = UnitId::new(1);
    assert!(grid.enemy_aggression_for_unit(unit).is_none());
    assert!(grid.occupy_cell(CellCoord::new(1, 1), unit, Team::Lower, 1));

    let enemy = grid
        .enemy_aggression_for_unit(unit)
        .expect("placed unit has a team");
    assert_eq!(enemy, grid.aggression_for_team(Team::Upper));
    assert_ne!(enemy, grid.aggression_for_team(Team::Lower));
}

#[test]
fn target_contests_are_returned_not_resolved() {
    let mut grid = open_grid(10);
    let lower = UnitId::new(1);
    let ally = UnitId::new(2);
    let upper = UnitId::new(3);

    let first = grid.target_to_cell(
        lower,
        Team::Lower,
        Some(CellCoord::new(0, 0)),
        Some(CellCoord::new(4, 4)),
    );
    let allied = grid.target_to_cell(
        ally,
        Team::Lower,
        Some(CellCoord::new(0, 1)),
        Some(CellCoord::new(4, 5)),
    );
    assert!(first.is_empty());
    assert!(allied.is_empty(), "claims from the same team never contest");

    let contests = grid.target_to_cell(
        upper,
        Team::Upper,
        Some(CellCoord::new(9, 9)),
        Some(CellCoord::new(5, 5)),
    );

    assert_eq!(contests.len(), 2);
    assert!(contests.iter().all(|contest| contest.team == Team::Lower));
    assert!(contests.iter().any(|contest| contest.claimant == lower));
    assert!(contests.iter().any(|contest| contest.claimant == ally));
    assert_eq!(
        grid.target_label(CellCoord::new(4, 4)),
        Some(CellLabel::Unit(lower))
    );
    assert_eq!(
        grid.target_label(CellCoord::new(5, 5)),
        Some(CellLabel::Unit(upper))
    );
}

#[test]
fn target_claims_need_both_cells() {
    let mut grid = open_grid(6);
    let unit = UnitId::new(1);

    let cell = CellCoord::new(2, 2);
    assert!(grid.target_to_cell(unit, Team::Lower, None, Some(cell)).is_empty());
    assert!(grid.target_to_cell(unit, Team::Lower, Some(cell), None).is_empty());
    assert!(grid.can_move_there(cell));
    assert_eq!(grid.team_of(unit), None);
}

#[test]
fn team_survives_release_until_claims_are_cleaned() {
    let mut grid = open_grid(6);
    let unit = UnitId::new(1);
    let _ = grid.target_to_cell(
        unit,
        Team::Upper,
        Some(CellCoord::new(0, 0)),
        Some(CellCoord::new(1, 1)),
    );
    assert_eq!(grid.team_of(unit), Some(Team::Upper));

    assert!(!grid.cleanup_all(unit, 0, UnitSize::Small));
    assert_eq!(grid.team_of(unit), None);
    assert!(grid.can_move_there(CellCoord::new(1, 1)));
}

// `can_move_there` only inspects target claims. Whether it should also reject
// occupied or obstacle cells is an open product question, so this pins the
// current behaviour.
#[test]
fn can_move_there_ignores_occupancy() {
    let config = GridConfig::new(12, 4, 6).expect("valid config");
    let mut grid = OccupancyGrid::with_terrain(&config, TerrainKind::WaterCenter);
    let occupied = CellCoord::new(0, 0);
    assert!(grid.occupy_cell(occupied, UnitId::new(1), Team::Lower, 0));

    assert!(grid.can_move_there(occupied));
    assert!(grid.can_move_there(CellCoord::new(6, 6)));
    assert!(!grid.can_move_there(CellCoord::new(12, 0)));

    let _ = grid.target_to_cell(
        UnitId::new(2),
        Team::Upper,
        Some(occupied),
        Some(CellCoord::new(1, 0)),
    );
    assert!(!grid.can_move_there(CellCoord::new(1, 0)));
    assert_eq!(grid.release_target_claims(UnitId::new(2)), 1);
    assert!(grid.can_move_there(CellCoord::new(1, 0)));
}

#[test]
fn holes_fill_both_layers() {
    let mut grid = open_grid(8);
    let cell = CellCoord::new(3, 0);

    assert!(grid.occupy_by_hole(&settings_for(8), cell));

    assert_eq!(grid.label(cell), Some(CellLabel::Obstacle(ObstacleType::Hole)));
    assert_eq!(grid.target_label(cell), Some(CellLabel::Obstacle(ObstacleType::Hole)));
    assert!(!grid.can_move_there(cell));
    assert_eq!(grid.matrix()[0][3], ObstacleType::Hole.numeric());
    assert!(!grid.occupy_cell(cell, UnitId::new(1), Team::Lower, 0));
}

#[test]
fn holes_survive_claims_and_their_release() {
    let mut grid = open_grid(8);
    let unit = UnitId::new(1);
    let hole = CellCoord::new(3, 3);
    assert!(grid.occupy_by_hole(&settings_for(8), hole));

    let contests = grid.target_to_cell(unit, Team::Lower, Some(CellCoord::new(2, 3)), Some(hole));
    assert!(contests.is_empty());
    assert_eq!(grid.target_label(hole), Some(CellLabel::Obstacle(ObstacleType::Hole)));

    assert_eq!(grid.release_target_claims(unit), 0);
    assert!(!grid.cleanup_all(unit, 0, UnitSize::Small));
    assert_eq!(grid.target_label(hole), Some(CellLabel::Obstacle(ObstacleType::Hole)));
    assert!(!grid.can_move_there(hole));
}

#[test]
fn holes_are_not_dug_under_units() {
    let mut grid = open_grid(8);
    let unit = UnitId::new(4);
    let cell = CellCoord::new(2, 2);
    assert!(grid.occupy_cell(cell, unit, Team::Upper, 1));

    assert!(!grid.occupy_by_hole(&settings_for(8), cell));

    assert_eq!(grid.occupant(cell), Some(unit));
    assert_eq!(grid.footprint(unit), Some(&[cell][..]));
    assert!(grid.cleanup_all(unit, 1, UnitSize::Small));
    assert_at_baseline(grid.aggression_for_team(Team::Upper));
    assert!(grid.occupy_by_hole(&settings_for(8), cell));
}

#[test]
fn narrowing_skips_occupied_and_claimed_cells() {
    let mut grid = open_grid(8);
    let settings = settings_for(8);
    assert!(grid.occupy_cell(CellCoord::new(0, 0), UnitId::new(1), Team::Lower, 0));
    let _ = grid.target_to_cell(
        UnitId::new(2),
        Team::Upper,
        Some(CellCoord::new(2, 2)),
        Some(CellCoord::new(7, 7)),
    );

    let holed = grid.narrow(0, &settings);

    assert_eq!(holed.len(), 26);
    assert!(!holed.contains(&CellCoord::new(0, 0)));
    assert!(!holed.contains(&CellCoord::new(7, 7)));
    assert_eq!(grid.occupant(CellCoord::new(0, 0)), Some(UnitId::new(1)));

    let inner = grid.narrow(1, &settings);
    assert_eq!(inner.len(), 20);
    assert!(grid.narrow(4, &settings).is_empty());
}

#[test]
fn display_renders_the_top_row_first() {
    let mut grid = open_grid(4);
    assert!(grid.occupy_cell(CellCoord::new(0, 3), UnitId::new(1), Team::Upper, 0));
    assert!(grid.occupy_by_hole(&settings_for(4), CellCoord::new(3, 0)));

    assert_eq!(grid.to_string(), "2...\n....\n....\n...H\n");
}
