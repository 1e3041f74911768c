use std::fmt::Write as _;

use ddb_core::attacks::NormalizedAttack;
use ddb_core::dice;

use crate::labels::{Heading, Locale, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttackPanelOptions {
    /// Adds a `//` comment line with mode, reach, range and properties.
    pub include_notes: bool,
}

/// One attack roll line and, when there is damage, one damage roll line per
/// attack under a `[Weapon Attacks]` header. Empty when there are no attacks.
pub fn render_attack_panel(
    attacks: &[NormalizedAttack],
    locale: Locale,
    options: AttackPanelOptions,
) -> String {
    let named: Vec<&NormalizedAttack> = attacks
        .iter()
        .filter(|attack| !attack.name.trim().is_empty())
        .collect();
    if named.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    writeln!(&mut out, "[{}]", locale.heading(Heading::WeaponAttacks))
        .expect("writing to String cannot fail");
    for attack in named {
        let name = attack.name.trim();
        writeln!(
            &mut out,
            "1d20{} {name}",
            dice::signed_suffix(attack.attack_bonus)
        )
        .expect("writing to String cannot fail");

        let damage = attack.damage.trim();
        if !damage.is_empty() {
            let damage_word = match &attack.damage_type {
                Some(damage_type) => format!(
                    "{} {}",
                    locale.damage_type(damage_type),
                    locale.term(Term::Damage)
                ),
                None => locale.term(Term::Damage).to_string(),
            };
            writeln!(&mut out, "{damage} {name} {damage_word}")
                .expect("writing to String cannot fail");
        }

        if options.include_notes
            && let Some(notes) = attack_notes(attack, locale)
        {
            writeln!(&mut out, "// {notes}").expect("writing to String cannot fail");
        }
    }
    out.trim_end().to_string()
}

/// Mode, reach, range, properties, magic and free-form notes joined by
/// `" / "`.
pub fn attack_notes(attack: &NormalizedAttack, locale: Locale) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(mode) = attack.mode {
        parts.push(locale.attack_mode(mode).to_string());
    }
    if let Some(reach) = attack.reach_feet {
        parts.push(format!("{} {}", locale.term(Term::Reach), locale.feet(reach)));
    }
    if let Some(range) = attack.range {
        let span = match (locale, range.long) {
            (Locale::English, Some(long)) => format!("{}/{long} ft", range.normal),
            (Locale::Korean, Some(long)) => format!("{}/{}", locale.feet(range.normal), locale.feet(long)),
            (_, None) => locale.feet(range.normal),
        };
        parts.push(format!("{} {span}", locale.term(Term::Range)));
    }
    if !attack.properties.is_empty() {
        let properties = attack
            .properties
            .iter()
            .map(|p| locale.weapon_property(*p))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("{}: {properties}", locale.term(Term::Properties)));
    }
    if attack.is_magic {
        parts.push(locale.term(Term::Magic).to_string());
    }
    if let Some(notes) = attack.notes.as_deref().map(str::trim)
        && !notes.is_empty()
    {
        parts.push(notes.to_string());
    }
    (!parts.is_empty()).then(|| parts.join(" / "))
}
