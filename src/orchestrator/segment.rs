/// Split model output into suggestion blocks.
///
/// A block starts at every line that, once trimmed, begins with a digit
/// followed by `". "` or `") "`. Other lines join the current block,
/// keeping their line breaks. Lines shorter than three characters never
/// start a block. Text before the first numbered line forms its own block.
/// The result is capped at `max` after segmentation.
pub fn split_suggestions(text: &str, max: usize) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        if starts_block(line) {
            push_block(&mut blocks, &current);
            current = line.to_string();
        } else {
            current.push('\n');
            current.push_str(line);
        }
    }
    push_block(&mut blocks, &current);

    blocks.truncate(max);
    blocks
}

fn starts_block(line: &str) -> bool {
    let bytes = line.trim().as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_digit() && matches!(&bytes[1..3], b". " | b") ")
}

fn push_block(blocks: &mut Vec<String>, block: &str) {
    let block = block.trim();
    if !block.is_empty() {
        blocks.push(block.to_string());
    }
}
