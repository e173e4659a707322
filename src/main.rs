// Entry point and interactive console flow.
//
// - Option [1] loads the rate card CSV and resolves its columns.
// - Option [2] collects filters, the uplift and the effective month.
// - Option [3] runs the uplift and writes the reports.
// The loaded dataset is kept as an immutable snapshot; every report run
// borrows it and builds fresh results.
use clap::Parser;
use once_cell::sync::Lazy;
use rate_uplift::config::AppConfig;
use rate_uplift::filter::distinct_values;
use rate_uplift::util::{format_int, format_optional};
use rate_uplift::{
    engine, loader, output, reports, schema, Dataset, Dimension, FilterSelection, RevenueModel,
    Schema, UpliftScenario, UpliftSpec,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rate-uplift")]
#[command(about = "Revenue and margin impact of a charge rate uplift")]
struct Args {
    /// Rate card CSV export
    #[arg(short, long, default_value = "rate_card_data.csv")]
    data: PathBuf,

    /// JSON file overriding column names, dropped rows and output names
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        data: None,
        scenario: None,
    })
});

struct AppState {
    data: Option<(Dataset, Schema)>,
    scenario: Option<UpliftScenario>,
}

/// Lock the shared state, recovering it if an earlier panic poisoned the lock.
fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Print `label` and read one trimmed line from stdin.
fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    prompt("Enter choice: ")
}

/// Handle option [1]: load the rate card and resolve its columns.
///
/// On success the dataset and schema replace whatever was loaded before,
/// and any previously set parameters are cleared since they may name
/// months or values the new file lacks. Load and configuration errors are
/// printed and leave the state untouched.
fn handle_load(args: &Args, cfg: &AppConfig) {
    let (table, load_report) = match loader::load_table(&args.data, &cfg.drop_rows) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
            return;
        }
    };
    let resolved = schema::resolve(&table.headers, &cfg.columns)
        .and_then(|s| Dataset::from_table(&table, &s).map(|ds| (ds, s)));
    let (dataset, schema) = match resolved {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Configuration error: {}\n", e);
            return;
        }
    };

    println!(
        "Processing rate card... ({} rows loaded, {} dropped, {} blank)",
        format_int(load_report.kept_rows),
        format_int(load_report.dropped_rows),
        format_int(load_report.blank_rows)
    );
    let labels = schema.month_labels();
    println!(
        "Months: {} ({} .. {})",
        labels.len(),
        labels.first().map(String::as_str).unwrap_or(""),
        labels.last().map(String::as_str).unwrap_or("")
    );
    if !schema.unparsed_months.is_empty() {
        println!(
            "Warning: could not read a date from {}; ordered last.",
            schema.unparsed_months.join(", ")
        );
    }
    for dim in Dimension::ALL {
        if schema.dimension(dim).is_none() {
            println!("Note: no `{}` column; it cannot be filtered.", dim.label());
        }
    }
    if dataset.missing_revenue_cells > 0 {
        println!(
            "Note: {} blank revenue cells treated as 0.",
            format_int(dataset.missing_revenue_cells)
        );
    }
    println!();

    let mut st = state();
    st.data = Some((dataset, schema));
    st.scenario = None;
}

/// Ask for allowed values on each dimension the file actually has.
///
/// Blank input or `All` leaves the dimension unconstrained.
fn prompt_selection(dataset: &Dataset, schema: &Schema) -> FilterSelection {
    let mut selection = FilterSelection::new();
    for dim in Dimension::ALL {
        if schema.dimension(dim).is_none() {
            continue;
        }
        let values = distinct_values(dataset, dim);
        println!("{} options: {}", dim.label(), values.join(", "));
        let input = prompt(&format!("Select {} (comma-separated, blank = All): ", dim.label()));
        let picked: Vec<String> = input
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
            .map(str::to_string)
            .collect();
        selection.set(dim, picked);
    }
    selection
}

/// Keep asking until the uplift type and value form a valid `UpliftSpec`.
fn prompt_spec() -> UpliftSpec {
    loop {
        println!("Uplift Type: [1] Percentage  [2] Fixed $ per Day");
        let kind = read_choice();
        let value = match prompt("Enter uplift value: ").parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                println!("Invalid number.");
                continue;
            }
        };
        let spec = match kind.as_str() {
            "1" => UpliftSpec::Percentage(value),
            "2" => UpliftSpec::FixedPerDay(value),
            _ => {
                println!("Invalid choice. Please enter 1 or 2.");
                continue;
            }
        };
        match spec.validate() {
            Ok(()) => return spec,
            Err(e) => println!("{}", e),
        }
    }
}

fn prompt_effective_month(schema: &Schema) -> usize {
    loop {
        let input = prompt(&format!(
            "Effective month ({}; blank = first): ",
            schema.month_labels().join(", ")
        ));
        if input.is_empty() {
            return 0;
        }
        match schema.month_index(&input) {
            Ok(i) => return i,
            Err(e) => println!("{}", e),
        }
    }
}

fn prompt_model() -> RevenueModel {
    loop {
        println!("Revenue model: [1] Scale recorded revenue  [2] Recompute from billable days");
        match read_choice().as_str() {
            "" | "1" => return RevenueModel::Baseline,
            "2" => return RevenueModel::Recompute,
            _ => println!("Invalid choice. Please enter 1 or 2."),
        }
    }
}

/// Handle option [2]: collect filters, uplift, effective month and
/// revenue model into a scenario.
fn handle_parameters() {
    // Clone out of the lock so prompting does not hold it.
    let data = state().data.clone();
    let Some((dataset, schema)) = data else {
        println!("Error: No data loaded. Please load the rate card first (option 1).\n");
        return;
    };

    let selection = prompt_selection(&dataset, &schema);
    let spec = prompt_spec();
    let effective_month = prompt_effective_month(&schema);
    let model = prompt_model();
    println!();

    state().scenario = Some(UpliftScenario::new(selection, spec, effective_month).with_model(model));
}

fn report_path(args: &Args, name: &str) -> PathBuf {
    Path::new(&args.out_dir).join(name)
}

/// Handle option [3]: run the uplift and write every report.
///
/// Side effects:
/// - writes the monthly totals, margin and detail CSVs,
/// - writes the JSON summary,
/// - and prints previews of the totals and margins to the console.
///
/// A configuration error stops the run before any file is written.
fn handle_generate_reports(args: &Args, cfg: &AppConfig) {
    let (data, scenario) = {
        let st = state();
        (st.data.clone(), st.scenario.clone())
    };
    let Some((dataset, schema)) = data else {
        println!("Error: No data loaded. Please load the rate card first (option 1).\n");
        return;
    };
    let Some(scenario) = scenario else {
        println!("Error: No uplift parameters set. Please choose option 2 first.\n");
        return;
    };

    let outcome = match engine::run(&dataset, &schema, &scenario) {
        Ok(o) => o,
        Err(e) => {
            error!(error = %e, "uplift failed");
            eprintln!("Configuration error: {}\n", e);
            return;
        }
    };

    println!("Generating reports...");
    println!(
        "Uplift {} from {} ({} of {} rows affected)\n",
        scenario.spec,
        schema.months[scenario.effective_month].label,
        format_int(outcome.affected_rows),
        format_int(dataset.len())
    );

    let totals = reports::monthly_totals_report(&outcome.reconciliation.totals);
    let totals_file = report_path(args, &cfg.output.totals_csv);
    if let Err(e) = output::write_csv(&totals_file, &totals) {
        eprintln!("Write error: {}", e);
    }
    println!("Monthly Revenue Summary\n");
    output::preview_table_rows(&totals, cfg.output.preview_rows);
    println!("(Full table exported to {})\n", totals_file.display());

    if let Some(margin) = &outcome.margin {
        let rows = reports::margin_report(margin, &outcome);
        let margin_file = report_path(args, &cfg.output.margin_csv);
        if let Err(e) = output::write_csv(&margin_file, &rows) {
            eprintln!("Write error: {}", e);
        }
        println!("Affected Role Margins\n");
        output::preview_table_rows(&rows, cfg.output.preview_rows);
        println!(
            "Average new margin: {}% (was {}%)\n",
            format_optional(margin.aggregate_pct, 2),
            format_optional(margin.original_aggregate_pct, 2)
        );
    } else {
        println!("Margins not available: charge or cost rate column missing.\n");
    }

    let (header, records) = reports::detail_table(&outcome);
    let detail_file = report_path(args, &cfg.output.detail_csv);
    if let Err(e) = output::write_records(&detail_file, &header, &records) {
        eprintln!("Write error: {}", e);
    }
    println!("(Detailed data exported to {})", detail_file.display());

    let summary = reports::generate_summary(&outcome, &scenario);
    let summary_file = report_path(args, &cfg.output.summary_json);
    if let Err(e) = output::write_json(&summary_file, &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("(Summary exported to {})\n", summary_file.display());
    info!(affected = outcome.affected_rows, "reports written");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to read config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    loop {
        println!("Rate Uplift Calculator:");
        println!("[1] Load rate card");
        println!("[2] Set uplift parameters");
        println!("[3] Generate uplift report");
        println!("[4] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&args, &cfg),
            "2" => handle_parameters(),
            "3" => {
                println!();
                handle_generate_reports(&args, &cfg);
            }
            "4" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1 to 4.\n"),
        }
    }
}
