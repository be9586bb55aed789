//! Page scripts behind [`crate::ScriptDom`].
//!
//! Every script is an IIFE: the shared prelude, then `const args = <json>;`, then a body
//! that returns a JSON-serialisable value.

use serde_json::Value;

const PRELUDE: &str = r#"
const ATTR = "data-campaignforge-anchor";
const isVisible = (el) => {
  if (!(el instanceof Element)) return false;
  const style = window.getComputedStyle(el);
  if (style.visibility === 'hidden' || style.display === 'none') return false;
  const rect = el.getBoundingClientRect();
  return rect.width > 0 && rect.height > 0;
};
let fresh = 0;
const tag = (el, prefix) => {
  let token = el.getAttribute(ATTR);
  if (!token) {
    token = prefix + '-' + (fresh++);
    el.setAttribute(ATTR, token);
  }
  return token;
};
const byToken = (token) => document.querySelector('[' + ATTR + '="' + token + '"]');
const isTextControl = (el) => !!el && (el.tagName === 'TEXTAREA' ||
  (el.tagName === 'INPUT' && !['button', 'submit', 'checkbox', 'radio', 'hidden'].includes((el.type || '').toLowerCase())));
const isEditable = (el) => !!el && (el.isContentEditable || el.getAttribute('role') === 'textbox' || isTextControl(el));
const textOf = (el) => isTextControl(el) ? (el.value || '') : (el.innerText || el.textContent || '');
const setNativeValue = (el, value) => {
  const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
  const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
  if (descriptor && descriptor.set) descriptor.set.call(el, value); else el.value = value;
};
const fire = (el, names) => names.forEach((name) => el.dispatchEvent(new Event(name, { bubbles: true, cancelable: true })));
const describe = (el, source, prefix) => {
  const r = el.getBoundingClientRect();
  const placeholder = ['placeholder', 'aria-placeholder', 'data-placeholder', 'aria-label']
    .map((name) => el.getAttribute(name) || '').join(' ').trim().toLowerCase();
  const className = typeof el.className === 'string' ? el.className : (el.getAttribute('class') || '');
  const text = textOf(el).trim() || el.getAttribute('aria-label') || '';
  return {
    handle: { token: tag(el, prefix) },
    source,
    tag: el.tagName.toLowerCase(),
    rect: { x: r.left, y: r.top, width: r.width, height: r.height },
    content_editable: !!el.isContentEditable,
    role: el.getAttribute('role'),
    placeholder,
    class_name: className.toLowerCase(),
    text: text.trim().toLowerCase().slice(0, 200),
    data_control: el.getAttribute('data-control-name'),
    input_type: el.getAttribute('type'),
    disabled: !!el.disabled || el.getAttribute('aria-disabled') === 'true',
  };
};
"#;

pub(crate) fn wrap(body: &str, args: &Value) -> String {
    format!("(() => {{\n{PRELUDE}\nconst args = {args};\n{body}\n}})()")
}

pub(crate) const PROBE: &str = r#"
const root = args.scope ? byToken(args.scope) : document;
if (!root) return [];
const seen = new Set();
const out = [];
const consider = (el, source) => {
  if (out.length >= args.limit || seen.has(el)) return;
  seen.add(el);
  if (!isVisible(el)) return;
  const r = el.getBoundingClientRect();
  if (!(r.width > args.min_width && r.height > args.min_height)) return;
  if (args.in_viewport && (r.top < 0 || r.left < 0)) return;
  out.push(describe(el, source, args.prefix));
};
for (const selector of args.selectors) {
  let nodes = [];
  try { nodes = root.querySelectorAll(selector); } catch (e) { continue; }
  for (const el of nodes) consider(el, selector);
}
if (args.phrases.length) {
  for (const el of root.querySelectorAll('*')) {
    const own = ['placeholder', 'aria-placeholder', 'data-placeholder', 'aria-label']
      .map((name) => el.getAttribute(name) || '').join(' ').toLowerCase();
    const text = (el.textContent || '').toLowerCase();
    const phrase = args.phrases.find((p) => own.includes(p) || text.includes(p));
    if (phrase) consider(el, 'text:' + phrase);
  }
}
return out;
"#;

pub(crate) const ACTIVATE: &str = r#"
const el = byToken(args.token);
if (!el) return { found: false, focused: false };
try { el.scrollIntoView({ block: 'center' }); } catch (e) {}
if (typeof el.focus === 'function') el.focus();
if (typeof el.click === 'function') el.click();
const active = document.activeElement;
return { found: true, focused: !!active && (active === el || el.contains(active)) };
"#;

pub(crate) const CLICK: &str = r#"
const el = byToken(args.token);
if (!el || !isVisible(el)) return false;
if (el.disabled || el.getAttribute('aria-disabled') === 'true') return false;
try { el.scrollIntoView({ block: 'center' }); } catch (e) {}
if (typeof el.focus === 'function') el.focus();
el.click();
return true;
"#;

pub(crate) const VIEWPORT: &str = r#"
return { x: 0, y: 0, width: window.innerWidth, height: window.innerHeight };
"#;

pub(crate) const FOCUSED: &str = r#"
const el = document.activeElement;
if (!el || el === document.body || el === document.documentElement) return null;
return describe(el, 'focused', args.prefix);
"#;

pub(crate) const READ_TEXT: &str = r#"
const el = byToken(args.token);
return el ? textOf(el) : null;
"#;

pub(crate) const FOCUSED_TEXT: &str = r#"
const el = document.activeElement;
if (!el || el === document.body || el === document.documentElement) return null;
return textOf(el);
"#;

pub(crate) const IS_VISIBLE: &str = r#"
const el = byToken(args.token);
return !!el && isVisible(el);
"#;

pub(crate) const EXEC_INSERT: &str = r#"
const el = document.activeElement;
if (!isEditable(el)) return false;
return !!document.execCommand('insertText', false, args.text);
"#;

pub(crate) const REPLACE_CONTENT: &str = r#"
const usable = (el) => {
  if (!el || !isVisible(el) || !isEditable(el)) return false;
  const r = el.getBoundingClientRect();
  return r.width > 30 && r.height > 15;
};
let el = args.token ? byToken(args.token) : null;
if (!usable(el)) {
  el = Array.from(document.querySelectorAll(
    '[contenteditable="true"], [contenteditable="plaintext-only"], [role="textbox"], textarea'
  )).find(usable) || null;
}
if (!el) return null;
el.focus();
if (isTextControl(el)) {
  setNativeValue(el, args.text);
} else {
  el.innerHTML = '';
  el.textContent = args.text;
}
fire(el, ['input', 'change', 'keyup', 'keydown', 'paste']);
return { token: tag(el, args.prefix) };
"#;

pub(crate) const REPLACE_HTML_FOCUSED: &str = r#"
const el = document.activeElement;
if (!el || !el.isContentEditable) return false;
el.innerHTML = args.html;
fire(el, ['input']);
return true;
"#;

pub(crate) const PASTE_FOCUSED: &str = r#"
const el = document.activeElement;
if (!isEditable(el)) return false;
const before = textOf(el);
let dispatched = false;
try {
  const data = new DataTransfer();
  data.setData('text/plain', args.text);
  el.dispatchEvent(new ClipboardEvent('paste', { clipboardData: data, bubbles: true, cancelable: true }));
  dispatched = true;
} catch (e) {}
if (!dispatched || textOf(el) === before) {
  if (isTextControl(el)) setNativeValue(el, args.text); else el.textContent = args.text;
  fire(el, ['input']);
}
return true;
"#;

pub(crate) const SET_FIELD_VALUE: &str = r#"
const el = byToken(args.token);
if (!el) return false;
el.focus();
if (isTextControl(el)) setNativeValue(el, args.value); else el.textContent = args.value;
fire(el, ['input', 'change']);
return true;
"#;

pub(crate) const VISIBLE_LABELLED: &str = r#"
for (const el of document.querySelectorAll('button, [role="button"], input[type="submit"]')) {
  if (!isVisible(el)) continue;
  const label = (el.innerText || el.textContent || el.value || el.getAttribute('aria-label') || '')
    .trim().toLowerCase();
  if (args.labels.includes(label)) return true;
}
return false;
"#;

pub(crate) const EDITABLE_REGIONS: &str = r#"
const out = [];
for (const el of document.querySelectorAll('[contenteditable="true"], [contenteditable="plaintext-only"], textarea')) {
  if (!isVisible(el)) continue;
  const r = el.getBoundingClientRect();
  if (r.width > args.min_width && r.height > args.min_height) {
    out.push({ rect: { x: r.left, y: r.top, width: r.width, height: r.height }, text: textOf(el) });
  }
}
return out;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrap_embeds_args_as_json() {
        let script = wrap(READ_TEXT, &json!({ "token": "a\"b" }));
        assert!(script.starts_with("(() => {"));
        assert!(script.trim_end().ends_with("})()"));
        assert!(script.contains(r#"const args = {"token":"a\"b"};"#));
        assert!(script.contains("data-campaignforge-anchor"));
    }
}
