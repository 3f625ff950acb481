const FENCE: &str = "```";

/// Renders the instruction sent to the model.
///
/// The plot is embedded verbatim. A `文体:` (style) line is added for any
/// non-empty `style`, whitespace included. The wording stays Japanese so the
/// model answers in the language the plots are written in.
pub fn build_prompt(description: &str, style: Option<&str>) -> String {
    let style_line = match style.filter(|s| !s.is_empty()) {
        Some(style) => format!("\n文体: {}", style),
        None => String::new(),
    };

    format!(
        "
以下の説明に基づいて小説を書いてください。
マークダウンの装飾は使用せず、純粋なテキストのみを返してください。

プロット:
{description}
{style_line}

要件:
- 適切な段落分けを行う
- 読みやすい文章にする
- 物語に一貫性を持たせる
- 登場人物の感情や心理描写を含める

注意:
- マークダウンの装飾は使用しないでください
- テキストのみを返してください
"
    )
}

/// Cleans up a complete model response.
///
/// Strips a surrounding code fence, trims the text and each of its lines,
/// and collapses runs of blank lines into a single paragraph break.
pub fn clean_text(text: &str) -> String {
    let mut text = text;

    if let Some(start) = text.find(FENCE) {
        // skip the fence line along with any language tag
        if let Some(newline) = text[start..].find('\n') {
            text = &text[start + newline + 1..];
        }
        if let Some(end) = text.rfind(FENCE) {
            text = &text[..end];
        }
    }

    let mut out: Vec<&str> = Vec::new();
    for line in text.trim().lines().map(str::trim) {
        if line.is_empty() && out.last().is_some_and(|prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    out.join("\n")
}
