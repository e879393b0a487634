///
/// Sanitize
/// In-place normalization applied to entities before they are written.
///
/// Text is trimmed of leading and trailing whitespace; containers and
/// nested composites forward to their contents. Sanitizing never fails.
///

pub trait Sanitize {
    fn sanitize(&mut self);
}

impl Sanitize for String {
    fn sanitize(&mut self) {
        trim_text(self);
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&mut self) {
        if let Some(inner) = self {
            inner.sanitize();
        }
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&mut self) {
        for item in self {
            item.sanitize();
        }
    }
}

impl<T: Sanitize + ?Sized> Sanitize for Box<T> {
    fn sanitize(&mut self) {
        (**self).sanitize();
    }
}

/// Trim `text` in place, reallocating only when something changes.
pub fn trim_text(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

pub fn sanitize<T: Sanitize + ?Sized>(node: &mut T) {
    node.sanitize();
}
