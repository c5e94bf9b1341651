// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use chrono::{NaiveDate, NaiveDateTime};
use libfuzzer_sys::fuzz_target;

use mediadate::detector;
use mediadate::template::NamingTemplate;

#[derive(Arbitrary, Debug)]
struct Input {
    template: String,
    filename: String,
    year: u16,
    ordinal: u16,
    seconds: u32,
    video: bool,
}

fn date(input: &Input) -> Option<NaiveDateTime> {
    let day = NaiveDate::from_yo_opt(i32::from(input.year % 10_000), u32::from(input.ordinal % 366) + 1)?;
    day.and_hms_opt(0, 0, 0)?
        .checked_add_signed(chrono::Duration::seconds(i64::from(input.seconds % 86_400)))
}

fuzz_target!(|input: Input| {
    if let Some(prefix) = detector::detect(&input.filename) {
        assert!(prefix.eq_ignore_ascii_case("photo") || prefix.eq_ignore_ascii_case("video"));
        assert!(detector::is_canonical(&input.filename));
    }

    let Ok(template) = NamingTemplate::compile(&input.template) else {
        return;
    };
    let Some(date) = date(&input) else {
        return;
    };

    let label = if input.video { "Video" } else { "Photo" };
    let rendered = template.render(&date, label);

    // Rendering is a single pass, so rendering again yields the same text
    assert_eq!(rendered, template.render(&date, label));
    if template.variables().next().is_none() {
        assert_eq!(rendered, input.template);
    }
});
