// output formatting - streamed replies for humans or raw json

use crate::core::{Classification, Outcome, Reply};
use std::io::Write;

/// Prints a reply as it streams in, only writing the new tail each time.
#[derive(Default)]
pub struct Typewriter {
    printed: usize,
}

impl Typewriter {
    pub fn new() -> Self {
        Self::default()
    }

    // partials only ever grow, so the old text is always a prefix
    pub fn update(&mut self, text: &str) {
        if let Some(tail) = text.get(self.printed..) {
            print!("{tail}");
            std::io::stdout().flush().ok();
        }
        self.printed = text.len();
    }

    pub fn finish(self, reply: &Reply) {
        match reply.outcome {
            Outcome::Completed if self.printed > 0 => println!(),
            Outcome::Fallback { .. } if self.printed > 0 => {
                // whatever streamed before the failure is not the answer
                println!("\n\n{}", reply.text);
            }
            Outcome::Canned { category } => println!("[{category}] {}", reply.text),
            _ => println!("{}", reply.text),
        }
    }
}

pub struct Output;

impl Output {
    pub fn raw(reply: &Reply) {
        println!("{}", serde_json::to_string(reply).unwrap_or_default());
    }

    pub fn classification(result: &Classification) {
        match result.category {
            Some(category) => println!("matched: {category}"),
            None => println!("no match"),
        }
    }
}
