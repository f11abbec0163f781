/// Lowercase, transliterated, hyphen-separated form of a title.
///
/// Non-Latin scripts are transliterated rather than dropped, so titles in
/// other alphabets never collapse into the same empty slug.
pub fn slugify(title: &str) -> String {
    ::slug::slugify(title.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_collapses_separators() {
        assert_eq!(slugify("Lobo e Cão"), "lobo-e-cao");
        assert_eq!(slugify("  O Agente Secreto!  "), "o-agente-secreto");
        assert_eq!(slugify("Ainda Estou Aqui: 2024"), "ainda-estou-aqui-2024");
        assert_eq!(slugify("L'Été dernier"), "l-ete-dernier");
    }

    #[test]
    fn titles_differing_in_case_or_accents_share_a_slug() {
        assert_eq!(slugify("CORAÇÃO DE CERVO"), slugify("Coracao de Cervo"));
    }

    #[test]
    fn transliterates_letters_outside_western_europe() {
        assert_eq!(slugify("Krzysztof Kieślowski"), "krzysztof-kieslowski");
        assert_eq!(slugify("Łódź"), "lodz");
        assert_eq!(slugify("Čapek"), "capek");
    }

    #[test]
    fn other_scripts_get_distinct_non_empty_slugs() {
        let cyrillic = slugify("Тетрадь");
        let japanese = slugify("千と千尋の神隠し");

        assert!(!cyrillic.is_empty());
        assert!(!japanese.is_empty());
        assert_ne!(cyrillic, japanese);
        assert!(cyrillic.starts_with("tetrad"), "{cyrillic}");
    }
}
