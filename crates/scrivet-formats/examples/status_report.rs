// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Renders a small Markdown status report with the stock formatters.
//!
//! Run with `cargo run --example status_report -p scrivet-formats`.

use chrono::{Offset, Utc};
use scrivet_engine::Template;
use scrivet_formats::standard_options;
use serde_json::json;

const REPORT: &str = "\
# Deploy report ${date|%d %B %Y}

$each(services)
- ${name}: ${uptime|0.00%} uptime$if_has_many(../incidents) (see incidents)$end
$end
$unless_has_many(incidents)
No open incidents.
$end
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let template = Template::parse(REPORT)?;
    let data = json!({
        "date": "2024-03-01",
        "services": [
            {"name": "api", "uptime": 0.9993},
            {"name": "worker", "uptime": 1.0},
        ],
        "incidents": [],
    });

    print!("{}", template.render_with(&data, &standard_options(Utc.fix()))?);
    Ok(())
}
