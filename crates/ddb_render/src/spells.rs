use std::fmt::Write as _;

use ddb_core::dice;
use ddb_core::spells::{SpellAction, SpellBook, SpellDetails, SpellDuration, SpellKind, SpellRange};
use ddb_core::stats::Statblock;

use crate::labels::{Heading, Locale, Term};

/// Spellcasting summaries per class, then one command block per prepared
/// spell, then the unprepared spells under their own header.
pub fn render_spell_panel(book: &SpellBook, statblock: &Statblock, locale: Locale) -> String {
    if book.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for casting in &book.spellcasting {
        let ability_mod = statblock.ability_modifier(casting.ability);
        writeln!(
            &mut out,
            "[{}] {}",
            locale.heading(Heading::Spellcasting),
            casting.class_name
        )
        .expect("writing to String cannot fail");
        writeln!(
            &mut out,
            "{}: {} ({} {})",
            locale.term(Term::SpellAbility),
            casting.ability.abbreviation(),
            locale.term(Term::Modifier),
            dice::signed(ability_mod)
        )
        .expect("writing to String cannot fail");
        writeln!(
            &mut out,
            "{} 1d20{}",
            locale.term(Term::SpellAttack),
            dice::signed(casting.attack_bonus)
        )
        .expect("writing to String cannot fail");
        writeln!(&mut out, "{} {}", locale.term(Term::SpellSaveDc), casting.save_dc)
            .expect("writing to String cannot fail");
        out.push('\n');
    }

    for spell in &book.prepared {
        write_spell_block(&mut out, spell, locale);
    }

    if !book.unprepared.is_empty() {
        writeln!(&mut out, "[{}]", locale.heading(Heading::OtherSpells))
            .expect("writing to String cannot fail");
        for spell in &book.unprepared {
            write_spell_block(&mut out, spell, locale);
        }
    }

    out.trim().to_string()
}

fn write_spell_block(out: &mut String, spell: &SpellAction, locale: Locale) {
    let name = spell.name.as_str();
    writeln!(out, "// [{}] {name}", locale.heading(Heading::Spell))
        .expect("writing to String cannot fail");

    match &spell.kind {
        SpellKind::SpellAttack { to_hit_bonus, .. } => {
            writeln!(
                out,
                "1d20{} ▼ {}: {name}",
                dice::signed(*to_hit_bonus),
                locale.term(Term::Hit)
            )
            .expect("writing to String cannot fail");
        }
        SpellKind::SpellSave {
            dc, save_ability, ..
        } => {
            let ability = save_ability.map_or("?", |a| locale.ability(a));
            writeln!(out, "// {}: {ability} DC {dc}", locale.term(Term::SaveThrow))
                .expect("writing to String cannot fail");
        }
        SpellKind::SpellOther {} => {}
    }

    if let Some((dice_expr, damage_type)) = spell.kind.damage() {
        let label = locale.term(Term::SpellDamage);
        match damage_type {
            Some(damage_type) => writeln!(
                out,
                "{dice_expr} ▼ {label}: {name} ({})",
                locale.damage_type(damage_type)
            )
            .expect("writing to String cannot fail"),
            None => writeln!(out, "{dice_expr} ▼ {label}: {name}")
                .expect("writing to String cannot fail"),
        }
    }

    if let Some(effect) = &spell.details.effect {
        writeln!(out, "// {}: {effect}", locale.term(Term::Effect))
            .expect("writing to String cannot fail");
    }
    if let Some(notes) = spell_notes(&spell.details, locale) {
        writeln!(out, "// {}: {notes}", locale.term(Term::Notes))
            .expect("writing to String cannot fail");
    }
    out.push('\n');
}

/// Range, casting time, duration, concentration, ritual, components and area
/// joined by `" / "`.
pub fn spell_notes(details: &SpellDetails, locale: Locale) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(range) = details.range.as_ref().and_then(|r| format_range(r, locale)) {
        parts.push(format!("{}: {range}", locale.term(Term::Range)));
    }
    if let Some(casting) = details.casting_time {
        parts.push(format!(
            "{}: {} {}",
            locale.term(Term::CastingTime),
            casting.amount,
            locale.activation(casting.unit)
        ));
    }
    if let Some(duration) = &details.duration {
        parts.push(format!(
            "{}: {}",
            locale.term(Term::Duration),
            format_duration(duration, locale)
        ));
    }
    if details.concentration {
        parts.push(locale.term(Term::Concentration).to_string());
    }
    if details.ritual {
        parts.push(locale.term(Term::Ritual).to_string());
    }
    if !details.components.is_empty() {
        let letters = details
            .components
            .iter()
            .map(|c| c.letter())
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("{}: {letters}", locale.term(Term::Components)));
    }
    if let Some(area) = details.range.as_ref().and_then(|r| r.area.as_ref()) {
        let shape = area.shape.to_lowercase();
        let text = match area.size_feet {
            Some(size) => format!("{} {shape}", locale.feet(size)),
            None => shape,
        };
        parts.push(format!("{}: {text}", locale.term(Term::Area)));
    }
    (!parts.is_empty()).then(|| parts.join(" / "))
}

fn format_range(range: &SpellRange, locale: Locale) -> Option<String> {
    if let Some(feet) = range.feet {
        return Some(locale.feet(feet));
    }
    let origin = range.origin.as_deref()?.trim();
    let text = match origin.to_ascii_lowercase().as_str() {
        "" => return None,
        "self" => locale.term(Term::SelfRange).to_string(),
        "touch" => locale.term(Term::Touch).to_string(),
        _ => origin.to_string(),
    };
    Some(text)
}

fn format_duration(duration: &SpellDuration, locale: Locale) -> String {
    match duration {
        SpellDuration::Instantaneous => locale.term(Term::Instantaneous).to_string(),
        SpellDuration::Special => locale.term(Term::Special).to_string(),
        SpellDuration::Timed { amount, unit } => match locale {
            Locale::English => format!("{amount} {}", locale.duration_unit(*unit, *amount)),
            Locale::Korean => format!("{amount}{}", locale.duration_unit(*unit, *amount)),
        },
        SpellDuration::Other { label } => label.clone(),
    }
}
