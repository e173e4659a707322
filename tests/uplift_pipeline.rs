use rate_uplift::config::ColumnNames;
use rate_uplift::loader::read_table;
use rate_uplift::{
    apply_uplift, evaluate_margin, partition, reconcile, resolve, run, ConfigError, Dataset,
    Dimension, FilterSelection, RevenueModel, Schema, UpliftScenario, UpliftSpec,
};

const RATE_CARD: &str = "\
Branch,Capability,Department / Team,Job Title,Charge Rate Daily,Cost Rate Daily,Jan-25 Revenue,Feb-25 Revenue,Mar-25 Revenue
Sydney,Data,Analytics,Analyst,800,500,16000,17600,15200
Sydney,Cloud,Platform,Engineer,1000,650,20000,22000,19000
Melbourne,Data,Analytics,Analyst,750,480,15000,16500,14250
Melbourne,Cloud,Platform,Architect,1400,900,28000,30800,26600
Perth,Data,Analytics,Lead,0,700,0,0,0
Perth,,Platform,Engineer,950,600,19000,20900,18050
";

fn load(csv: &str) -> (Dataset, Schema) {
    let (table, _) = read_table(csv.as_bytes(), &[]).unwrap();
    let schema = resolve(&table.headers, &ColumnNames::default()).unwrap();
    let dataset = Dataset::from_table(&table, &schema).unwrap();
    (dataset, schema)
}

fn selections() -> Vec<FilterSelection> {
    vec![
        FilterSelection::new(),
        FilterSelection::new().with(Dimension::Branch, ["Sydney"]),
        FilterSelection::new().with(Dimension::Capability, ["Data"]),
        FilterSelection::new()
            .with(Dimension::Branch, ["Melbourne", "Perth"])
            .with(Dimension::JobTitle, ["Engineer", "Architect"]),
        FilterSelection::new().with(Dimension::Department, ["Finance"]),
    ]
}

fn specs() -> Vec<UpliftSpec> {
    vec![
        UpliftSpec::Percentage(0.0),
        UpliftSpec::Percentage(7.5),
        UpliftSpec::FixedPerDay(0.0),
        UpliftSpec::FixedPerDay(120.0),
    ]
}

#[test]
fn partitions_are_disjoint_and_exhaustive() {
    let (ds, schema) = load(RATE_CARD);
    for sel in selections() {
        let p = partition(&ds, &schema, &sel).unwrap();
        assert_eq!(p.affected.len() + p.unaffected.len(), ds.len());
        let mut ids: Vec<usize> = p
            .affected
            .rows
            .iter()
            .chain(&p.unaffected.rows)
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..ds.len()).collect::<Vec<_>>());
    }
}

#[test]
fn baseline_is_never_modified() {
    let (ds, schema) = load(RATE_CARD);
    let snapshot: Vec<Vec<u64>> = ds
        .rows
        .iter()
        .map(|r| r.revenue.iter().map(|v| v.to_bits()).collect())
        .collect();
    for sel in selections() {
        for spec in specs() {
            let scenario = UpliftScenario::new(sel.clone(), spec, 1);
            run(&ds, &schema, &scenario).unwrap();
            let p = partition(&ds, &schema, &sel).unwrap();
            apply_uplift(&p.affected, &spec, 0, &schema).unwrap();
        }
    }
    let after: Vec<Vec<u64>> = ds
        .rows
        .iter()
        .map(|r| r.revenue.iter().map(|v| v.to_bits()).collect())
        .collect();
    assert_eq!(snapshot, after);
}

#[test]
fn zero_percentage_is_identity() {
    let (ds, schema) = load(RATE_CARD);
    let up = apply_uplift(&ds, &UpliftSpec::Percentage(0.0), 0, &schema).unwrap();
    for row in &up.rows {
        assert_eq!(row.revenue, row.source.revenue);
    }
}

#[test]
fn earlier_months_are_untouched_for_every_effective_month() {
    let (ds, schema) = load(RATE_CARD);
    for k in 0..schema.months.len() {
        for spec in specs() {
            let outcome = run(&ds, &schema, &UpliftScenario::new(FilterSelection::new(), spec, k)).unwrap();
            for row in &outcome.reconciliation.rows {
                assert_eq!(row.revenue[..k], row.source.revenue[..k]);
            }
            assert_eq!(outcome.reconciliation.totals.months.len(), schema.months.len() - k);
        }
    }
}

#[test]
fn row_count_is_preserved_for_match_all_and_match_none() {
    let (ds, schema) = load(RATE_CARD);
    for sel in selections() {
        let outcome = run(&ds, &schema, &UpliftScenario::new(sel, UpliftSpec::Percentage(10.0), 0)).unwrap();
        assert_eq!(outcome.reconciliation.rows.len(), ds.len());
        assert_eq!(outcome.affected_rows + outcome.unaffected_rows, ds.len());
    }
    let none = FilterSelection::new().with(Dimension::Department, ["Finance"]);
    let outcome = run(&ds, &schema, &UpliftScenario::new(none, UpliftSpec::Percentage(10.0), 0)).unwrap();
    assert_eq!(outcome.affected_rows, 0);
    assert_eq!(outcome.reconciliation.totals.delta, 0.0);
    assert_eq!(outcome.margin.unwrap().aggregate_pct, None);
}

#[test]
fn two_row_percentage_scenario() {
    let (ds, schema) = load(
        "Branch,Charge Rate Daily,Feb-25 Revenue,Jan-25 Revenue\n\
         A,100,1100,1000\n\
         B,200,2200,2000\n",
    );
    // Columns arrive Feb-first; months are ordered by date.
    assert_eq!(schema.month_labels(), vec!["Jan-25", "Feb-25"]);
    assert!(schema.unparsed_months.is_empty());
    let feb = schema.month_index("Feb-25").unwrap();
    assert_eq!(feb, 1);

    let sel = FilterSelection::new().with(Dimension::Branch, ["A"]);
    let p = partition(&ds, &schema, &sel).unwrap();
    let up = apply_uplift(&p.affected, &UpliftSpec::Percentage(10.0), feb, &schema).unwrap();
    let rec = reconcile(&up, &p.unaffected).unwrap();

    let a = &rec.rows[0];
    assert_eq!(a.revenue[0], 1000.0);
    assert!((a.revenue[1] - 1210.0).abs() < 1e-9);
    assert_eq!(rec.rows[1].revenue, vec![2000.0, 2200.0]);

    let feb_total = rec.totals.month("Feb-25").unwrap();
    assert!((feb_total.uplifted - 3410.0).abs() < 1e-9);
    assert!(rec.totals.month("Jan-25").is_none());
    let jan_total: f64 = rec.rows.iter().map(|r| r.revenue[0]).sum();
    assert_eq!(jan_total, 3000.0);
}

#[test]
fn fixed_uplift_on_zero_rate_row() {
    let (ds, schema) = load("Branch,Charge Rate Daily,Jan-25 Revenue\nC,0,500\n");
    let up = apply_uplift(&ds, &UpliftSpec::FixedPerDay(50.0), 0, &schema).unwrap();
    assert_eq!(up.rows[0].revenue, vec![500.0]);
    assert_eq!(up.zero_rate_rows, 1);
}

#[test]
fn margin_after_percentage_uplift() {
    let (ds, schema) = load("Charge Rate Daily,Cost Rate Daily,Jan-25 Revenue\n100,60,1000\n");
    let up = apply_uplift(&ds, &UpliftSpec::Percentage(25.0), 0, &schema).unwrap();
    let margin = evaluate_margin(&up, &schema).unwrap();
    assert_eq!(up.rows[0].new_rate, Some(125.0));
    assert!((margin.rows[0].new_margin_pct - 52.0).abs() < 1e-9);
    assert!((margin.aggregate_pct.unwrap() - 52.0).abs() < 1e-9);
}

#[test]
fn fixed_uplift_scales_each_row_by_its_own_ratio() {
    let (ds, schema) = load(RATE_CARD);
    let sel = FilterSelection::new().with(Dimension::Capability, ["Data"]);
    let outcome = run(&ds, &schema, &UpliftScenario::new(sel, UpliftSpec::FixedPerDay(80.0), 0)).unwrap();
    let rows = &outcome.reconciliation.rows;
    // 800/day analyst: ratio 0.1
    assert!((rows[0].revenue[0] - 17600.0).abs() < 1e-6);
    // 750/day analyst: ratio 80/750
    assert!((rows[2].revenue[0] - 16600.0).abs() < 1e-6);
    // zero-rate lead is left alone, unaffected rows too
    assert_eq!(rows[4].revenue, rows[4].source.revenue);
    assert_eq!(rows[1].revenue, rows[1].source.revenue);
    assert_eq!(outcome.zero_rate_rows, 1);

    let margin = outcome.margin.unwrap();
    assert_eq!(margin.rows.len(), 3);
    // lead: new rate 80 against cost 700 is defined (negative) margin
    assert!(margin.rows.iter().all(|m| !m.new_margin_pct.is_nan()));
    assert!(margin.rows[2].original_margin_pct.is_nan());
}

#[test]
fn recompute_model_is_opt_in() {
    let csv = "Charge Rate Daily,Jan-25 Revenue,Jan-25 Billable Days,Jan-25 Chargeability\n\
               500,9000,20,90%\n";
    let (ds, schema) = load(csv);
    let base = run(
        &ds,
        &schema,
        &UpliftScenario::new(FilterSelection::new(), UpliftSpec::FixedPerDay(100.0), 0),
    )
    .unwrap();
    let recomputed = run(
        &ds,
        &schema,
        &UpliftScenario::new(FilterSelection::new(), UpliftSpec::FixedPerDay(100.0), 0)
            .with_model(RevenueModel::Recompute),
    )
    .unwrap();
    assert!((base.reconciliation.rows[0].revenue[0] - 10800.0).abs() < 1e-6);
    assert!((recomputed.reconciliation.rows[0].revenue[0] - 10800.0).abs() < 1e-6);
    assert_eq!(recomputed.reconciliation.totals.original, 9000.0);
}

#[test]
fn config_errors_halt_before_any_output() {
    let (ds, schema) = load("Branch,Jan-25 Revenue\nSydney,100\n");
    let err = run(
        &ds,
        &schema,
        &UpliftScenario::new(FilterSelection::new(), UpliftSpec::FixedPerDay(25.0), 0),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "column `charge rate` is required for fixed-per-day uplift");

    let (table, _) = read_table("Branch,Charge Rate Daily\nSydney,100\n".as_bytes(), &[]).unwrap();
    assert_eq!(
        resolve(&table.headers, &ColumnNames::default()),
        Err(ConfigError::NoMonthColumns)
    );
}
