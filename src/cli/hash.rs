use std::path::PathBuf;

use super::load_and_generate;

pub fn cmd_hash(input: PathBuf, full: bool) {
    let (_, source) = load_and_generate(&input);
    let hash = source.content_hash().to_hex();
    let shown = if full { &hash[..] } else { &hash[..16] };
    println!("{} {} ({})", shown, input.display(), source.file_name);
}
