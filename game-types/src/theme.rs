/// Theme keys a game may draw cards from, with their display labels.
pub const THEMES: &[(&str, &str)] = &[
    ("time", "Time"),
    ("clube", "Clube"),
    ("jogador_atividade", "Jogador em atividade"),
    ("jogador_aposentado", "Jogador aposentado"),
    ("estadio", "Estádio"),
    ("tecnico", "Técnicos"),
    ("ano", "Ano"),
];

pub fn is_known_theme(key: &str) -> bool {
    THEMES.iter().any(|(theme, _)| *theme == key)
}

pub fn theme_label(key: &str) -> Option<&'static str> {
    THEMES
        .iter()
        .find(|(theme, _)| *theme == key)
        .map(|(_, label)| *label)
}

/// Keep only catalog themes, in the caller's order. Repeats stay, so a
/// theme listed twice comes up twice as often in the cycle.
pub fn filter_known_themes<S: AsRef<str>>(requested: &[S]) -> Vec<String> {
    requested
        .iter()
        .map(|theme| theme.as_ref().trim())
        .filter(|theme| is_known_theme(theme))
        .map(str::to_string)
        .collect()
}
