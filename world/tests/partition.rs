use grid_explorer_core::{CellCoord, Classification, Command, GridPoint, Resolution};
use grid_explorer_world::{self as world, query, Grid};
use proptest::prelude::*;

fn classification() -> impl Strategy<Value = Classification> {
    prop_oneof![
        Just(Classification::Unknown),
        Just(Classification::Known),
        Just(Classification::Seen),
        Just(Classification::Ignored),
        Just(Classification::Disconnected),
    ]
}

fn command(columns: u32, rows: u32) -> impl Strategy<Value = Command> {
    // Allow indices one past each edge so out-of-range commands are exercised.
    let cell = (0..=columns, 0..=rows).prop_map(|(column, row)| CellCoord::new(column, row));
    prop_oneof![
        (cell.clone(), classification(), -10i32..300, -10i32..300).prop_map(
            |(cell, classification, x, y)| Command::ClassifyCell {
                cell,
                classification,
                navigable_point: GridPoint::new(x, y),
            }
        ),
        (cell, classification()).prop_map(|(cell, classification)| {
            Command::ForceClassification {
                cell,
                classification,
            }
        }),
    ]
}

fn assert_partitioned(grid: &Grid) {
    let (columns, rows) = query::dimensions(grid);
    let counts = query::counts(grid);
    assert_eq!(counts.total(), (columns * rows) as usize);

    let mut listed = 0;
    for classification in Classification::ALL {
        for cell in query::cells_with(grid, classification) {
            assert_eq!(cell.classification(), classification);
            listed += 1;
        }
        assert_eq!(
            query::cells_with(grid, classification).count(),
            counts.get(classification)
        );
    }
    assert_eq!(listed, (columns * rows) as usize);

    let from_cells = query::cells(grid).filter(|cell| cell.classification() == Classification::Seen);
    assert_eq!(from_cells.count(), counts.seen);
}

proptest! {
    #[test]
    fn commands_preserve_the_partition(
        columns in 1u32..8,
        rows in 1u32..8,
        commands in prop::collection::vec(command(8, 8), 0..64),
    ) {
        let mut grid = world::build(columns, rows, |_, point| Resolution {
            point,
            reachable: true,
        });
        let mut events = Vec::new();

        for command in commands {
            world::apply(&mut grid, command, &mut events);
            assert_partitioned(&grid);
        }
    }

    #[test]
    fn completion_matches_the_explorable_ratio(
        commands in prop::collection::vec(command(5, 5), 0..48),
    ) {
        let mut grid = world::build(5, 5, |_, point| Resolution {
            point,
            reachable: true,
        });
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut grid, command, &mut events);
        }

        let counts = query::counts(&grid);
        let completion = query::completion_percentage(&grid);
        prop_assert!((0.0..=100.0).contains(&completion));

        let explorable = counts.unknown + counts.known + counts.seen;
        let expected = if explorable == 0 {
            0.0
        } else {
            100.0 * counts.seen as f32 / explorable as f32
        };
        prop_assert_eq!(completion, expected);
    }
}

#[test]
fn events_trace_every_transition() {
    let mut grid = world::build(3, 3, |_, point| Resolution {
        point,
        reachable: true,
    });
    let mut events = Vec::new();
    let cell = CellCoord::new(2, 2);

    for classification in [
        Classification::Known,
        Classification::Known,
        Classification::Seen,
        Classification::Ignored,
    ] {
        world::apply(
            &mut grid,
            Command::ForceClassification {
                cell,
                classification,
            },
            &mut events,
        );
    }

    assert_eq!(events.len(), 3, "repeated classification must not emit");
    assert_eq!(query::classification(&grid, cell), Some(Classification::Ignored));
}
