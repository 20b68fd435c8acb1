#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use scrivet_engine::{RenderOptions, Template};
use scrivet_formats::{DateFormatter, NumberFormatter};

static OPTIONS: Lazy<RenderOptions> = Lazy::new(|| {
    RenderOptions::builder()
        .register_formatter(DateFormatter::utc())
        .register_formatter(NumberFormatter)
        .build()
});

fuzz_target!(|data: &[u8]| {
    let source = match std::str::from_utf8(data) {
        Ok(src) => src,
        Err(_) => return,
    };

    if let Ok(template) = Template::parse(source) {
        let _ = template.render_with(&serde_json::Value::Null, &OPTIONS);
    }
});
