//! # quire CLI
//!
//! Usage:
//!   quire input.json -o pages.json
//!   echo '{ ... }' | quire
//!   quire --example > report.json

use std::env;
use std::fs;
use std::io::{self, Read};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return;
    }

    // First non-flag argument is the input file; otherwise read stdin.
    let input = match args.first().filter(|a| !a.starts_with('-')) {
        Some(path) => fs::read_to_string(path).expect("Failed to read input file"),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .expect("Failed to read stdin");
            buf
        }
    };

    let output_path = args
        .iter()
        .position(|a| a == "-o")
        .and_then(|i| args.get(i + 1))
        .cloned();

    match quire::render_json(&input) {
        Ok(pages) => {
            let json = serde_json::to_string_pretty(&pages).expect("Failed to serialize pages");
            match output_path {
                Some(path) => {
                    fs::write(&path, &json).expect("Failed to write output");
                    eprintln!("✓ {} page(s) written to {}", pages.len(), path);
                }
                None => println!("{json}"),
            }
        }
        Err(e) => {
            eprintln!("✗ Render failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn example_report_json() -> &'static str {
    r##"{
  "page": {
    "width": 595.28,
    "height": 841.89,
    "margin": { "top": 54, "right": 54, "bottom": 54, "left": 54 }
  },
  "styles": {
    "body": {
      "fontSizeQp": 40,
      "leading": 1.2,
      "spaceAfter": 6
    },
    "title": {
      "parent": "body",
      "fontSizeQp": 72,
      "bold": true,
      "spaceAfter": 12
    },
    "section": {
      "parent": "body",
      "fontSizeQp": 48,
      "bold": true,
      "spaceBefore": 12,
      "spaceAfter": 6
    },
    "fine-print": {
      "parent": "body",
      "fontSizeQp": 32,
      "color": { "r": 0.35, "g": 0.35, "b": 0.4 },
      "alignment": "Justify"
    }
  },
  "blocks": [
    {
      "type": "Paragraph",
      "style": "title",
      "text": [{ "text": "Quarterly Sales Report" }]
    },
    {
      "type": "Paragraph",
      "style": "body",
      "text": [
        { "text": "Figures are " },
        { "text": "unaudited", "italic": true },
        { "text": " and cover Q2 2026." }
      ]
    },
    { "type": "Spacer", "height": 12 },
    {
      "type": "Paragraph",
      "style": "section",
      "text": [{ "text": "Revenue by Region" }]
    },
    {
      "type": "Table",
      "rows": [
        [
          { "content": [{ "text": "Region" }] },
          { "content": [{ "text": "Revenue" }] },
          { "content": [{ "text": "Change" }] }
        ],
        [
          { "content": [{ "text": "North" }] },
          { "content": [{ "text": "$1,204,000" }] },
          { "content": [{ "text": "+4.2%" }] }
        ],
        [
          { "content": [{ "text": "South" }] },
          { "content": [{ "text": "$987,500" }] },
          { "content": [{ "text": "-1.1%" }] }
        ],
        [
          { "content": [{ "text": "Overseas" }] },
          { "content": [{ "text": "$2,310,900" }] },
          { "content": [{ "text": "+9.8%" }] }
        ]
      ],
      "columns": ["Auto", { "Fixed": 120 }, { "Fixed": 80 }],
      "headerRows": 1,
      "splittable": true,
      "banding": [
        { "r": 1, "g": 1, "b": 1 },
        { "r": 0.95, "g": 0.95, "b": 0.97 }
      ],
      "styleRules": [
        {
          "rows": [0, 0],
          "cols": [0, 2],
          "style": {
            "bold": true,
            "color": { "r": 1, "g": 1, "b": 1 },
            "background": { "r": 0.12, "g": 0.12, "b": 0.18 }
          }
        }
      ],
      "grid": { "width": 0.5, "color": { "r": 0.8, "g": 0.8, "b": 0.8 } }
    },
    { "type": "PageBreak" },
    {
      "type": "Paragraph",
      "style": "fine-print",
      "text": [
        { "text": "This report was generated automatically. Regional figures are aggregated from subsidiary ledgers and rounded to the nearest dollar; totals may therefore differ from the sum of their parts." }
      ]
    }
  ]
}"##
}
