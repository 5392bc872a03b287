//! # Widgetbox CLI
//!
//! Usage:
//!   widgetbox scenario.json
//!   echo '{ ... }' | widgetbox
//!   widgetbox scenario.json --json
//!   widgetbox --example > scenario.json
//!
//! Logs go to stderr; set `RUST_LOG` (default `widgetbox=info`).

use std::env;
use std::fs;
use std::io::{self, Read};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("widgetbox=info"));
    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false),
    );
    if subscriber.try_init().is_err() {
        eprintln!("logging already initialized");
    }
}

fn main() {
    init_logging();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_scenario_json());
        return;
    }

    let input = match args.iter().skip(1).find(|a| !a.starts_with('-')) {
        Some(path) => fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e)),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map(|_| buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))
        }
    };
    let input = match input {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("✗ {}", msg);
            std::process::exit(1);
        }
    };

    let result = if args.iter().any(|a| a == "--json") {
        widgetbox::run_scenario_report(&input)
    } else {
        widgetbox::run_scenario_json(&input)
    };

    match result {
        Ok(out) => println!("{}", out),
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn example_scenario_json() -> &'static str {
    r##"{
  "options": {
    "minWidth": 240,
    "minHeight": 160
  },
  "document": {
    "viewport": { "width": 960, "height": 720 },
    "children": [
      {
        "kind": { "type": "Element", "tag": "p" },
        "children": [{ "kind": { "type": "Text", "content": "Quarterly summary" } }]
      },
      {
        "kind": {
          "type": "Element",
          "tag": "div",
          "attributes": {
            "data-widget-type": "table",
            "data-widget-config": "{\"showHeader\":true,\"columns\":[{\"id\":\"col-metric\",\"label\":\"Metric\"},{\"id\":\"col-value\",\"label\":\"Value\",\"align\":\"right\",\"format\":\"number\"}],\"rows\":[{\"id\":\"row-1\",\"cells\":[{\"columnId\":\"col-metric\",\"value\":\"Revenue\"},{\"columnId\":\"col-value\",\"value\":1200}]}]}"
          },
          "measured": { "width": 480, "height": 220 }
        }
      },
      { "kind": { "type": "Element", "tag": "p" } },
      { "kind": { "type": "Element", "tag": "p" }, "children": [{ "kind": { "type": "Element", "tag": "br" } }] },
      {
        "kind": {
          "type": "Element",
          "tag": "div",
          "attributes": {
            "data-widget-type": "graph",
            "data-position": "free",
            "data-widget-config": "{\"chartType\":\"line\",\"labels\":[\"Q1\",\"Q2\",\"Q3\"],\"datasets\":[{\"id\":\"rev\",\"label\":\"Revenue\",\"data\":[10,14,19]}]}"
          },
          "style": { "left": 520, "top": 300, "width": 320, "height": 200 }
        }
      },
      {
        "kind": {
          "type": "Element",
          "tag": "div",
          "attributes": {
            "data-widget-type": "text",
            "data-position": "free",
            "data-widget-config": "{\"content\":\"Notes\",\"style\":{\"alignment\":\"center\",\"fontSize\":14}}"
          },
          "style": { "left": 520, "top": 40, "width": 320, "height": 160 }
        }
      }
    ]
  },
  "gestures": [
    { "widget": 0, "direction": "se", "dx": 60, "dy": 20 },
    { "widget": 1, "direction": "w", "dx": -40, "dy": 0, "preserveRatio": true },
    { "widget": 2, "direction": "s", "dx": 0, "dy": 40 }
  ]
}"##
}
