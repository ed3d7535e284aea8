use std::{fs, path::PathBuf};

/// Markdown table accumulated by a bench run.
pub struct Report {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Report {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn to_markdown(&self) -> String {
        let line = |cells: &[String]| format!("| {} |\n", cells.join(" | "));
        let headers = self.headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
        let rule = vec!["---".to_string(); headers.len()];

        let mut table = line(&headers) + &line(&rule);
        for row in &self.rows {
            table.push_str(&line(row));
        }
        table
    }
}

fn results_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("benchmarks")
        .join("RESULTS.md")
}

/// Replace (or append) the `section` block of the results file with `content`.
pub fn update_results(section: &str, content: &str) -> std::io::Result<()> {
    let tag = section.to_uppercase();
    let start = format!("<!-- {tag}_START -->");
    let end = format!("<!-- {tag}_END -->");
    let block = format!("{start}\n{content}\n{end}\n");

    let path = results_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut body = fs::read_to_string(&path)
        .unwrap_or_else(|_| "# Windowed Attention Benchmarks\n\n".to_string());

    match (body.find(&start), body.find(&end)) {
        (Some(from), Some(to)) => {
            let to = (to + end.len() + 1).min(body.len());
            body.replace_range(from..to, &block)
        }
        _ => {
            if !body.ends_with('\n') {
                body.push('\n');
            }
            body.push_str(&block);
        }
    }

    fs::write(&path, body)
}
