//! URL slugs for catalog entities.

/// Lowercase, hyphen-separated form of `text`.
///
/// Common Latin diacritics are transliterated; any run of other
/// non-alphanumeric characters becomes a single hyphen.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars() {
        let mapped = transliterate(ch);
        let mut emitted = false;
        for c in mapped.chars().flat_map(char::to_lowercase) {
            if c.is_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c);
                emitted = true;
            }
        }
        if !emitted {
            pending_hyphen = true;
        }
    }

    slug
}

fn transliterate(ch: char) -> String {
    let replacement = match ch {
        'ç' | 'Ç' => "c",
        'ğ' | 'Ğ' => "g",
        'ı' | 'İ' => "i",
        'ö' | 'Ö' | 'ø' | 'Ø' => "o",
        'ş' | 'Ş' | 'ß' => "s",
        'ü' | 'Ü' => "u",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'Ò' | 'Ó' | 'Ô' | 'Õ' => "o",
        'ù' | 'ú' | 'û' | 'Ù' | 'Ú' | 'Û' => "u",
        'ñ' | 'Ñ' => "n",
        'æ' | 'Æ' => "ae",
        '&' => "and",
        _ => return ch.to_string(),
    };
    replacement.to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Smart Phones"), "smart-phones");
        assert_eq!(slugify("  Laptop   Bags -- 15\" "), "laptop-bags-15");
    }

    #[test]
    fn transliterates_diacritics() {
        assert_eq!(slugify("Küçük Ev Aletleri"), "kucuk-ev-aletleri");
        assert_eq!(slugify("Ses & Görüntü"), "ses-and-goruntu");
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
