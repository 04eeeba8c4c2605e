use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{CommentForm, NewNote, NoteForm};

/// Substrings that make a comment unacceptable. Matched case-sensitively.
pub const BAD_WORDS: &[&str] = &["редиска", "негодяй"];

/// Field error attached to `text` when a comment contains a forbidden word.
pub const WARNING: &str = "Не ругайтесь!";

/// Field error for a missing required value.
pub const REQUIRED: &str = "Обязательное поле.";

/// Upper bound for note titles and slugs.
pub const MAX_SLUG_LENGTH: usize = 100;
pub const MAX_TITLE_LENGTH: usize = 100;

const INVALID_SLUG: &str =
    "Значение должно состоять только из латинских букв, цифр, знаков подчёркивания или дефиса.";
const UNDERIVABLE_SLUG: &str = "Не удалось сформировать slug из заголовка, укажите его вручную.";

/// FormErrors
///
/// Field-scoped validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FormErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages recorded for `field`, empty if the field is clean.
    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Returns true if any of `words` occurs anywhere in `text`.
pub fn contains_forbidden(text: &str, words: &[&str]) -> bool {
    words.iter().any(|word| !word.is_empty() && text.contains(word))
}

/// validate_comment
///
/// Applies the required-text rule and the bad-words filter. Returns the text to
/// persist, unchanged, when the form is clean.
pub fn validate_comment(form: CommentForm) -> Result<String, FormErrors> {
    if form.text.trim().is_empty() {
        return Err(FormErrors::single("text", REQUIRED));
    }
    if contains_forbidden(&form.text, BAD_WORDS) {
        return Err(FormErrors::single("text", WARNING));
    }
    Ok(form.text)
}

/// validate_note
///
/// Checks title and slug shape and derives the slug from the title when the form
/// left it blank. Uniqueness is enforced by the repository, see [`slug_taken`].
pub fn validate_note(form: NoteForm) -> Result<NewNote, FormErrors> {
    let mut errors = FormErrors::default();

    let title = form.title.trim().to_string();
    if title.is_empty() {
        errors.add("title", REQUIRED);
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.add(
            "title",
            format!("Убедитесь, что это значение содержит не более {MAX_TITLE_LENGTH} символов."),
        );
    }

    let requested = form.slug.trim();
    let slug = if requested.is_empty() {
        let derived = slugify(&title);
        if derived.is_empty() && !title.is_empty() {
            errors.add("slug", UNDERIVABLE_SLUG);
        }
        derived
    } else {
        if !is_valid_slug(requested) {
            errors.add("slug", INVALID_SLUG);
        }
        requested.to_string()
    };

    if errors.is_empty() {
        Ok(NewNote {
            title,
            text: form.text,
            slug,
        })
    } else {
        Err(errors)
    }
}

/// Field error for a slug that already belongs to another note.
pub fn slug_taken(slug: &str) -> FormErrors {
    FormErrors::single(
        "slug",
        format!("{slug} - такой slug уже существует, придумайте уникальное значение!"),
    )
}

fn is_valid_slug(slug: &str) -> bool {
    slug.chars().count() <= MAX_SLUG_LENGTH
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// slugify
///
/// Transliterates Cyrillic to Latin, lowercases, drops everything that is not
/// `[a-z0-9_-]` or whitespace, collapses whitespace and hyphen runs into a single
/// `-` and trims the result to [`MAX_SLUG_LENGTH`] characters.
pub fn slugify(title: &str) -> String {
    let mut latin = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        match transliterate(c) {
            Some(replacement) => latin.push_str(replacement),
            None => latin.push(c),
        }
    }

    let mut slug = String::with_capacity(latin.len());
    let mut pending_dash = false;
    for c in latin.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    let mut slug: String = slug.chars().take(MAX_SLUG_LENGTH).collect();
    while slug.ends_with(['-', '_']) {
        slug.pop();
    }
    slug.trim_start_matches('_').to_string()
}

fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}
