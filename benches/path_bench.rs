//! Quick benchmark to verify path resolution and shaping performance

use finboard::format::{format_value, DataFormat};
use finboard::path::{discover_lists, flatten, materialize_rows, resolve_str, DisplayKind, Path};
use serde_json::{json, Map, Value};
use std::time::Instant;

/// Daily time series shaped like a typical finance API response
fn daily_series(days: usize) -> Value {
    let mut series = Map::new();
    for day in 0..days {
        series.insert(
            format!("2024-{:02}-{:02}", day / 28 % 12 + 1, day % 28 + 1),
            json!({
                "1. open": format!("{:.2}", 100.0 + day as f64 * 0.1),
                "2. high": format!("{:.2}", 101.0 + day as f64 * 0.1),
                "3. low": format!("{:.2}", 99.0 + day as f64 * 0.1),
                "4. close": format!("{:.2}", 100.5 + day as f64 * 0.1),
                "5. volume": (1_000 + day).to_string()
            }),
        );
    }
    json!({
        "Meta Data": {"1. Information": "Daily Prices", "2. Symbol": "IBM"},
        "Time Series (Daily)": series
    })
}

fn main() {
    let data = daily_series(300);

    println!("Path Resolution Performance Test");
    println!("================================\n");

    let paths = vec![
        "",
        "Meta Data-->2. Symbol",
        "Time Series (Daily)-->2024-03-15-->4. close",
        "Time Series (Daily)-->2024-12-28-->5. volume",
        "Time Series (Daily)-->missing-->4. close",
    ];

    for raw in &paths {
        let iterations = 200_000;
        let start = Instant::now();

        for _ in 0..iterations {
            let _ = resolve_str(&data, raw);
        }

        let elapsed = start.elapsed();
        println!("Path: {:60}", format!("\"{}\"", raw));
        println!("  Time for {} iterations: {:?}", iterations, elapsed);
        println!("  Per operation: {:?}\n", elapsed / iterations);
    }

    println!("Shaping Performance");
    println!("===================\n");

    let iterations = 1_000;
    let series_path = Path::parse("Time Series (Daily)");

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = flatten(&data);
    }
    println!("flatten ({} leaves): {:?} per op", flatten(&data).len(), start.elapsed() / iterations);

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = materialize_rows(&data, &series_path, 100);
    }
    println!("materialize_rows (100 rows): {:?} per op", start.elapsed() / iterations);

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = discover_lists(&data, DisplayKind::Chart);
    }
    println!("discover_lists: {:?} per op", start.elapsed() / iterations);

    let cell = json!("1234567.891");
    let iterations = 1_000_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = format_value(Some(&cell), DataFormat::Currency);
    }
    println!("format_value (currency): {:?} per op", start.elapsed() / iterations);
}
