//! Generates the script evaluated inside the chat webview to type and
//! submit a prompt.
//!
//! The chat page's markup is third-party and changes without notice, so
//! every element lookup is an ordered chain of selectors from most specific
//! to most generic, and the first hit wins. Submission waits a fixed delay
//! after the synthetic input event because the page's framework re-renders
//! (and enables its send button) asynchronously.

/// Candidate selectors for the prompt input, most specific first:
/// known id, known data attribute, then any editable region.
pub(crate) const INPUT_TARGETS: [&str; 3] = [
    "#prompt-textarea",
    "[data-id='prompt-textarea']",
    "div[contenteditable='true']",
];

/// Candidate selectors for the send control, most specific first.
/// When none matches (or the match is disabled) the script falls back to a
/// synthetic Enter keydown on the input element.
pub(crate) const SUBMIT_TARGETS: [&str; 4] = [
    "[data-testid='send-button']",
    "button[aria-label='Send message']",
    "button[aria-label='Send prompt']",
    "form button[type='submit']",
];

/// Delay between the input notification and the send-button lookup, giving
/// the page's framework time to process the change.
pub(crate) const SUBMIT_DELAY_MS: u32 = 200;

/// Resolve an ordered selector chain against a lookup function, returning
/// the index and value of the first candidate that matches. This is the
/// exact degradation order the generated script executes in the page.
pub(crate) fn first_match<T>(
    candidates: &[&str],
    mut lookup: impl FnMut(&str) -> Option<T>,
) -> Option<(usize, T)> {
    candidates
        .iter()
        .enumerate()
        .find_map(|(i, sel)| lookup(sel).map(|v| (i, v)))
}

/// `document.querySelector(a) || document.querySelector(b) || ...`
fn selector_chain_expr(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|sel| format!("document.querySelector({})", js_string(sel)))
        .collect::<Vec<_>>()
        .join(" || ")
}

/// Quote a string as a JS single-quoted literal.
fn js_string(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Escape text for interpolation into a JS template literal, preserving
/// newlines and never letting the text terminate the literal.
fn escape_template_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace('$', "\\$")
}

/// Build the inject-and-submit script for the chat webview.
///
/// Steps mirror a real keystroke as closely as programmatic access allows:
/// locate the input (abort with a visible alert if nothing matches), focus
/// it, select-all-and-delete the existing content, insert the text as plain
/// text via execCommand (not markup), dispatch a bubbling `input` event so
/// the page's framework notices the change, then after a short delay click
/// the send button or synthesize Enter at the input.
///
/// A missing send button has no user-facing error path: the typed text
/// stays in the input for manual submission.
pub(crate) fn inject_script(text: &str) -> String {
    let escaped = escape_template_literal(text);
    let input_chain = selector_chain_expr(&INPUT_TARGETS);
    let submit_chain = selector_chain_expr(&SUBMIT_TARGETS);
    format!(
        r#"
(function() {{
    const text = `{escaped}`;

    const inputEl = {input_chain};
    if (!inputEl) {{
        alert('PromptDock: could not find the chat input box.\nOpen a chat and try again.');
        return;
    }}

    // Some frameworks only observe changes while the element is focused
    inputEl.focus();

    document.execCommand('selectAll', false, null);
    document.execCommand('delete', false, null);
    document.execCommand('insertText', false, text);

    // Direct content mutation is invisible to frameworks that listen on
    // their own event channel; a bubbling input event is what a keystroke
    // would have produced.
    inputEl.dispatchEvent(new InputEvent('input', {{
        bubbles: true,
        cancelable: true,
        inputType: 'insertText',
        data: text
    }}));

    setTimeout(() => {{
        const sendBtn = {submit_chain};
        if (sendBtn && !sendBtn.disabled) {{
            sendBtn.click();
        }} else {{
            inputEl.dispatchEvent(new KeyboardEvent('keydown', {{
                bubbles: true,
                cancelable: true,
                key: 'Enter',
                code: 'Enter',
                keyCode: 13
            }}));
        }}
    }}, {SUBMIT_DELAY_MS});
}})();
"#
    )
}
