#![allow(dead_code)]

pub mod memory_fetcher;
pub mod page_server;

/// An index page with `categories` headings, each followed by `per_category`
/// document links. Ids are `c{category}-d{doc}`.
pub fn index_page(prefix: &str, categories: usize, per_category: usize) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><title>Notes</title></head><body>\n");
    html.push_str("<p>Course material. <a href=\"https://example.com/\">Home</a></p>\n");
    for c in 0..categories {
        html.push_str(&format!("<h3>Week {}/Part {}</h3>\n<ul>\n", c, c % 2));
        for d in 0..per_category {
            html.push_str(&format!(
                "<li><a href=\"{}c{}-d{}\">\n  Doc {}\n</a></li>\n",
                prefix, c, d, d
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</body></html>\n");
    html
}

pub fn body_for(id: &str) -> Vec<u8> {
    format!("%PDF-1.4\n% {}\n", id).repeat(8).into_bytes()
}

/// Every file under `dir` whose name ends in `.part`.
pub fn part_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(part_files(&path));
        } else if path.to_string_lossy().ends_with(".part") {
            out.push(path);
        }
    }
    out
}
