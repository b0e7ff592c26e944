use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Last `n` lines of the file at `path`, oldest first.
pub fn tail_lines(path: impl AsRef<Path>, n: usize) -> io::Result<Vec<String>> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut window = VecDeque::with_capacity(n.min(1024));
    for line in reader.lines() {
        let line = line?;
        if window.len() == n {
            window.pop_front();
        }
        window.push_back(line);
    }
    Ok(window.into())
}
