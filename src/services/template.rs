//! Placeholder rendering for text spoken to callers.
//!
//! Only a fixed set of `{NAME}` tokens is recognised. Any other braces pass through
//! untouched, `{{NAME}}` renders a literal `{NAME}`, and substituted values are
//! never scanned again.

use std::borrow::Cow;

use crate::models::BusinessContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    BusinessName,
    BusinessPhone,
    BusinessAddress,
}

impl Placeholder {
    pub const ALL: [Placeholder; 3] = [
        Placeholder::BusinessName,
        Placeholder::BusinessPhone,
        Placeholder::BusinessAddress,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::BusinessName => "BUSINESS_NAME",
            Placeholder::BusinessPhone => "BUSINESS_PHONE",
            Placeholder::BusinessAddress => "BUSINESS_ADDRESS",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }

    fn value(&self, ctx: &BusinessContext) -> String {
        match self {
            Placeholder::BusinessName => ctx.business.name.clone(),
            Placeholder::BusinessPhone => ctx.business.phone.clone().unwrap_or_default(),
            Placeholder::BusinessAddress => ctx.business.full_address(),
        }
    }
}

/// Renders `text` against the business context. Borrows when nothing changes.
pub fn render<'a>(text: &'a str, ctx: &BusinessContext) -> Cow<'a, str> {
    if !text.contains('{') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut changed = false;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        if let Some((token, consumed)) = escaped_token(tail) {
            out.push('{');
            out.push_str(token);
            out.push('}');
            rest = &tail[consumed..];
            changed = true;
        } else if let Some((placeholder, consumed)) = placeholder_token(tail) {
            out.push_str(&placeholder.value(ctx));
            rest = &tail[consumed..];
            changed = true;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Matches `{NAME}` at the start of `s` for a known placeholder.
fn placeholder_token(s: &str) -> Option<(Placeholder, usize)> {
    let close = s.find('}')?;
    let placeholder = Placeholder::parse(&s[1..close])?;
    Some((placeholder, close + 1))
}

/// Matches `{{NAME}}` at the start of `s` for a known placeholder.
fn escaped_token(s: &str) -> Option<(&'static str, usize)> {
    let inner = s.strip_prefix("{{")?;
    let close = inner.find("}}")?;
    let placeholder = Placeholder::parse(&inner[..close])?;
    Some((placeholder.token(), close + 4))
}
