use datapub::export::{DataPackage, DatasetDump, to_csv};
use datapub::scatter::{AggregationCache, ChartConfig, ScatterView};
use datapub::variables::{VariableSet, VariablesResponse, Year};

fn load_variables() -> VariableSet {
    let bytes = include_bytes!("fixtures/variables.json");
    let response: VariablesResponse = serde_json::from_slice(bytes).expect("Failed to parse variables");
    let mut set = VariableSet::new();
    set.receive(response);
    set
}

fn load_chart() -> ChartConfig {
    serde_json::from_slice(include_bytes!("fixtures/chart.json")).expect("Failed to parse chart")
}

#[test]
fn test_full_scatter_pipeline() {
    let variables = load_variables();
    let chart = load_chart();
    let frame = ScatterView::new(&chart, &variables).render(&mut AggregationCache::new());

    // x years widen to 1999..2001 and 2003..2005, y years to 1999..2005, clamped to 2000..2005
    assert_eq!(frame.timeline_years, vec![2000, 2001, 2003, 2004, 2005]);
    assert_eq!(frame.time_range, Some((2000, 2005)));

    // Kenya has no x observation within a year of 2003
    let kenya = frame.current_data.iter().find(|s| s.key == "Kenya").unwrap();
    let years: Vec<Year> = kenya.values.iter().map(|p| p.year).collect();
    assert_eq!(years, vec![2000, 2001, 2004, 2005]);

    let last = kenya.values.last().unwrap();
    assert_eq!(last.x.as_ref().and_then(|v| v.as_f64()), Some(2.0));
    assert_eq!(last.y.as_ref().and_then(|v| v.as_f64()), Some(20.0));
    assert_eq!(last.time.y, Some(2004));

    let first = &kenya.values[0];
    assert_eq!(first.x.as_ref().and_then(|v| v.as_f64()), Some(1.0));
    assert_eq!(first.y.as_ref().and_then(|v| v.as_f64()), Some(10.0));
    assert_eq!(kenya.color.as_deref(), Some("#5675c1"));

    // Norway's single y observation (2003) only reaches 2002..2004
    let norway = frame.current_data.iter().find(|s| s.key == "Norway").unwrap();
    let years: Vec<Year> = norway.values.iter().map(|p| p.year).collect();
    assert_eq!(years, vec![2003, 2004]);

    assert_eq!(frame.legend.len(), 2);
    assert_eq!(frame.legend[0].label, "Africa");
}

#[test]
fn test_cached_frame_follows_window_changes() {
    let variables = load_variables();
    let mut chart = load_chart();
    let mut cache = AggregationCache::new();

    let full = ScatterView::new(&chart, &variables).render(&mut cache);
    chart.set_time_range(2004, 2005);
    let narrowed = ScatterView::new(&chart, &variables).render(&mut cache);

    assert_eq!(full.timeline_years, narrowed.timeline_years);
    for series in &narrowed.current_data {
        assert!(series.values.iter().all(|p| (2004..=2005).contains(&p.year)));
    }
}

#[test]
fn test_dataset_export() {
    let dump: DatasetDump =
        serde_json::from_slice(include_bytes!("fixtures/dataset.json")).expect("Failed to parse dataset");

    let csv = to_csv(&dump).unwrap();
    assert_eq!(csv, "Entity,Year,Pop,GDP\nA,2000,2,5\nA,2001,3,\n");

    let package = DataPackage::from_dump(&dump);
    let names: Vec<&str> = package.resources[0]
        .schema
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["Entity", "Year", "Pop", "GDP"]);
    assert_eq!(package.resources[0].path, "Demo: GDP & Population.csv");
    assert_eq!(dump.dataset.slug(), "demo-gdp-population");
}
