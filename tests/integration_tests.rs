use anyhow::Result;
use chrono::NaiveDate;
use revenue_amortization_builder::*;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn transaction(id: u64, money: f64, since: NaiveDate, till: NaiveDate) -> Transaction {
    Transaction {
        id,
        activated: since,
        money,
        since,
        till,
    }
}

#[test]
fn test_single_transaction_proration_scenario() -> Result<()> {
    // 300 over 2023-01-10..2023-03-05: 55 days, split 22 / 28 / 5.
    let transactions = vec![transaction(1044, 300.0, date(2023, 1, 10), date(2023, 3, 5))];
    let grid = MemoryGrid::new();

    let processor = AmortizationProcessor::new("ru");
    let plan = processor.plan(&grid, &transactions)?;

    assert_eq!(plan.span.since, date(2023, 1, 10));
    assert_eq!(plan.span.till, date(2023, 3, 5));
    assert_eq!(plan.anchor, date(2023, 1, 1));

    let usages: Vec<i64> = plan.cells.iter().map(|c| c.usage_days).collect();
    assert_eq!(usages, vec![22, 28, 5]);
    assert_eq!(usages.iter().sum::<i64>(), 55);

    let amounts: Vec<f64> = plan.cells.iter().map(|c| c.amount).collect();
    assert!((amounts[0] - 120.0).abs() < 0.01, "Jan: {}", amounts[0]);
    assert!((amounts[1] - 152.73).abs() < 0.01, "Feb: {}", amounts[1]);
    assert!((amounts[2] - 27.27).abs() < 0.01, "Mar: {}", amounts[2]);
    assert!((plan.previewed_total() - 300.0).abs() < 0.01);

    Ok(())
}

#[test]
fn test_multi_transaction_block() -> Result<()> {
    let transactions = vec![
        transaction(1046, 100.0, date(2023, 2, 1), date(2023, 2, 20)),
        transaction(1044, 300.0, date(2023, 1, 10), date(2023, 3, 5)),
        transaction(1045, 365.0, date(2023, 1, 1), date(2023, 12, 31)),
    ];
    let mut grid = MemoryGrid::new();

    let writer = MatrixWriter::new("ru");
    let plan = writer.plan(&grid, &transactions)?;

    // Span is the union of all intervals.
    assert_eq!(plan.span.since, date(2023, 1, 1));
    assert_eq!(plan.span.till, date(2023, 12, 31));

    // Rows in ascending id order from the default first row.
    let row_of = |id: u64| {
        plan.cells
            .iter()
            .find(|c| c.transaction_id == id)
            .map(|c| c.row)
            .unwrap()
    };
    assert_eq!(row_of(1044), 3);
    assert_eq!(row_of(1045), 4);
    assert_eq!(row_of(1046), 5);

    // Every transaction's usages partition its day count.
    for t in &plan.transactions {
        let usage_sum: i64 = plan
            .cells
            .iter()
            .filter(|c| c.transaction_id == t.id)
            .map(|c| c.usage_days)
            .sum();
        assert_eq!(usage_sum, days_in_period(t.since, t.till));
    }

    // The year-long transaction spreads a day's worth per day.
    let daily = plan
        .cells
        .iter()
        .filter(|c| c.transaction_id == 1045)
        .map(|c| c.amount)
        .sum::<f64>();
    assert!((daily - 365.0).abs() < 0.01);

    writer.commit(&mut grid, &plan)?;

    // Header covers January through December.
    assert_eq!(grid.read(1, 7), Some(CellValue::Date(date(2023, 1, 1))));
    assert_eq!(grid.read(1, 18), Some(CellValue::Date(date(2023, 12, 1))));

    // Single-month transaction occupies exactly one cell.
    assert!(grid.formula(5, 8).is_some());
    assert!(grid.formula(5, 7).is_none());
    assert!(grid.formula(5, 9).is_none());

    // Subtotal row then grand-total row.
    assert_eq!(
        grid.read(6, 1),
        Some(CellValue::Text("Subtotal".to_string()))
    );
    assert_eq!(grid.read(8, 1), Some(CellValue::Text("TOTAL".to_string())));

    Ok(())
}

#[test]
fn test_second_block_chains_onto_previous_totals() -> Result<()> {
    let writer = MatrixWriter::new("ru");
    let mut grid = MemoryGrid::new();

    let first = vec![transaction(1044, 300.0, date(2023, 1, 10), date(2023, 3, 5))];
    writer.run_allocation(&mut grid, &first)?;

    // First block: row 3, subtotal 4, grand total 6.
    assert_eq!(grid.read(6, 1), Some(CellValue::Text("TOTAL".to_string())));

    let second = vec![transaction(1050, 150.0, date(2023, 2, 15), date(2023, 4, 10))];
    let plan = writer.plan(&grid, &second)?;

    assert_eq!(plan.previous_total_row, Some(6));
    assert_eq!(plan.first_row, 9);

    // The header is already seeded at January; February starts one column in.
    assert_eq!(plan.anchor, date(2023, 1, 1));
    let columns: Vec<u32> = plan.cells.iter().map(|c| c.column).collect();
    assert_eq!(columns, vec![8, 9, 10]);

    // Only April is new; January through March were filled by the first run.
    assert_eq!(plan.header_writes.len(), 1);
    assert_eq!(plan.header_writes[0].month, date(2023, 4, 1));

    writer.commit(&mut grid, &plan)?;

    // The new grand-total row references the previous one.
    let outer = grid.formula(plan.outer_result_row, 7).unwrap();
    assert!(outer.contains("АДРЕС(6; СТОЛБЕЦ(); 2)"), "got: {outer}");
    assert!(outer.contains("ЕПУСТО"));

    Ok(())
}

#[test]
fn test_header_too_late_aborts_run() {
    let mut grid = MemoryGrid::new();
    grid.write_value(1, 7, CellValue::Date(date(2023, 3, 1)));
    grid.write_value(4, 1, CellValue::Text("TOTAL".to_string()));

    let transactions = vec![transaction(1044, 300.0, date(2023, 1, 10), date(2023, 3, 5))];
    let result = MatrixWriter::new("ru").plan(&grid, &transactions);

    match result {
        Err(AmortizationError::HeaderTooLate { anchor, required }) => {
            assert_eq!(anchor, date(2023, 3, 1));
            assert_eq!(required, date(2023, 1, 10));
        }
        other => panic!("expected HeaderTooLate, got {other:?}"),
    }
}

#[test]
fn test_marker_not_found_on_foreign_content() {
    let mut grid = MemoryGrid::new();
    grid.write_value(2, 3, CellValue::Text("unrelated sheet".to_string()));

    let transactions = vec![transaction(1, 10.0, date(2023, 1, 1), date(2023, 1, 31))];
    let result = run_allocation("ru", &transactions, &mut grid);

    assert!(matches!(
        result,
        Err(AmortizationError::MarkerNotFound(_))
    ));
}

#[test]
fn test_csv_ledger_to_grid_end_to_end() -> Result<()> {
    let csv_data = "\
1045;2023-01-15;CARD;250.0;2023-01-15;2023-02-14
1044;2023-01-09;SBS;300.0;2023-01-10;2023-03-05
1046;2023-02-01;SBS;100.0;2023-02-03;2023-02-17
";

    let transactions = load_ledger(csv_data.as_bytes(), DEFAULT_SOURCE_TAG)?;
    assert_eq!(transactions.len(), 2);

    let mut grid = MemoryGrid::new();
    let (span, anchor) = run_allocation("ru", &transactions, &mut grid)?;

    assert_eq!(span.since, date(2023, 1, 10));
    assert_eq!(span.till, date(2023, 3, 5));
    assert_eq!(anchor, date(2023, 1, 1));

    // Ledger rows landed in id order with their source values.
    assert_eq!(grid.read(3, 2), Some(CellValue::Number(1044.0)));
    assert_eq!(grid.read(4, 2), Some(CellValue::Number(1046.0)));
    assert_eq!(grid.read(4, 3), Some(CellValue::Number(100.0)));

    // The single-month transaction has its one localized formula.
    let cell = grid.formula(4, 8).unwrap();
    assert!(cell.contains("РАЗНДАТ"));
    assert!(cell.contains("И("), "single-month branch must be present");

    Ok(())
}

#[test]
fn test_plan_serializes_to_json() -> Result<()> {
    let transactions = vec![transaction(1044, 300.0, date(2023, 1, 10), date(2023, 3, 5))];
    let grid = MemoryGrid::new();

    let plan = AmortizationProcessor::new("ru").plan(&grid, &transactions)?;
    let json = plan.to_json()?;

    assert!(json.contains("\"locale\": \"ru\""));
    assert!(json.contains("2023-01-10"));
    assert!(json.contains("\"usage_days\": 22"));

    Ok(())
}

#[test]
fn test_unknown_locale_degrades_to_neutral_rendering() -> Result<()> {
    let transactions = vec![transaction(1, 60.0, date(2023, 5, 1), date(2023, 6, 30))];
    let mut grid = MemoryGrid::new();

    run_allocation("xx", &transactions, &mut grid)?;

    let cell = grid.formula(3, 7).unwrap();
    assert!(cell.contains("IF("));
    assert!(cell.contains("N(\""), "neutral comment marker expected");
    assert!(!cell.contains("ЕСЛИ"));

    Ok(())
}
