use datasage::models::SAMPLE_SIZE;
use datasage::services::profiler::ProfileComputer;
use datasage::services::table::{CellValue, Column, ColumnType, Table};
use proptest::prelude::*;

fn cell_strategy(column_type: ColumnType) -> BoxedStrategy<CellValue> {
    let value = match column_type {
        ColumnType::Integer => (-5i64..5).prop_map(CellValue::Integer).boxed(),
        ColumnType::Float => (-4i32..4).prop_map(|v| CellValue::Float(v as f64 / 2.0)).boxed(),
        ColumnType::Boolean => any::<bool>().prop_map(CellValue::Boolean).boxed(),
        ColumnType::Datetime => (1u32..6)
            .prop_map(|day| {
                let dt = chrono::NaiveDate::from_ymd_opt(2024, 1, day)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .expect("valid date");
                CellValue::DateTime(dt)
            })
            .boxed(),
        ColumnType::Text => "[a-d]{1,2}".prop_map(CellValue::Text).boxed(),
    };
    prop_oneof![1 => Just(CellValue::Missing), 3 => value].boxed()
}

fn column_type_strategy() -> impl Strategy<Value = ColumnType> {
    prop_oneof![
        Just(ColumnType::Integer),
        Just(ColumnType::Float),
        Just(ColumnType::Boolean),
        Just(ColumnType::Datetime),
        Just(ColumnType::Text),
    ]
}

fn table_strategy() -> impl Strategy<Value = Table> {
    (0usize..25, prop::collection::vec(column_type_strategy(), 0..5)).prop_flat_map(
        |(rows, types)| {
            let columns: Vec<_> = types
                .into_iter()
                .enumerate()
                .map(|(idx, column_type)| {
                    prop::collection::vec(cell_strategy(column_type), rows)
                        .prop_map(move |values| Column::new(format!("c{idx}"), column_type, values))
                })
                .collect();
            columns.prop_map(move |columns| Table::new(columns, rows).expect("consistent table"))
        },
    )
}

proptest! {
    #[test]
    fn counts_add_up_to_row_count(table in table_strategy()) {
        let profile = ProfileComputer::new().compute(&table);
        prop_assert_eq!(profile.row_count, table.row_count());
        prop_assert_eq!(profile.column_count, table.column_count());

        for (column, stats) in table.columns().iter().zip(&profile.columns) {
            let observed = column.values().iter().filter(|v| !v.is_missing()).count();
            prop_assert_eq!(stats.null_count + observed, table.row_count());
        }
    }

    #[test]
    fn null_percentage_is_bounded_and_rounded(table in table_strategy()) {
        let profile = ProfileComputer::new().compute(&table);
        for stats in &profile.columns {
            prop_assert!((0.0..=100.0).contains(&stats.null_percentage));
            let expected = if profile.row_count == 0 {
                0.0
            } else {
                (100.0 * stats.null_count as f64 / profile.row_count as f64 * 100.0).round() / 100.0
            };
            prop_assert_eq!(stats.null_percentage, expected);
        }
    }

    #[test]
    fn unique_count_is_bounded_by_observations(table in table_strategy()) {
        let profile = ProfileComputer::new().compute(&table);
        for stats in &profile.columns {
            prop_assert!(stats.unique_count <= profile.row_count - stats.null_count);
        }
    }

    #[test]
    fn samples_are_the_first_observations(table in table_strategy()) {
        let profile = ProfileComputer::new().compute(&table);
        for (column, stats) in table.columns().iter().zip(&profile.columns) {
            let expected: Vec<CellValue> = column
                .values()
                .iter()
                .filter(|v| !v.is_missing())
                .take(SAMPLE_SIZE)
                .cloned()
                .collect();
            prop_assert_eq!(stats.sample_values.len(), SAMPLE_SIZE.min(profile.row_count - stats.null_count));
            prop_assert_eq!(stats.sample_values.as_slice(), expected.as_slice());
            prop_assert_eq!(stats.dtype, column.column_type());
        }
    }

    #[test]
    fn profiling_is_idempotent(table in table_strategy()) {
        let computer = ProfileComputer::new();
        prop_assert_eq!(computer.compute(&table), computer.compute(&table));
    }
}
