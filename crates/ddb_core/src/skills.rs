use serde::Serialize;

use crate::ability::Ability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub const ALL: [Skill; 18] = [
        Skill::Athletics,
        Skill::Acrobatics,
        Skill::SleightOfHand,
        Skill::Stealth,
        Skill::Arcana,
        Skill::History,
        Skill::Investigation,
        Skill::Nature,
        Skill::Religion,
        Skill::AnimalHandling,
        Skill::Insight,
        Skill::Medicine,
        Skill::Perception,
        Skill::Survival,
        Skill::Deception,
        Skill::Intimidation,
        Skill::Performance,
        Skill::Persuasion,
    ];

    pub fn ability(self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    /// Modifier subtype naming this skill, e.g. `"sleight-of-hand"`.
    pub fn ddb_key(self) -> &'static str {
        match self {
            Skill::Athletics => "athletics",
            Skill::Acrobatics => "acrobatics",
            Skill::SleightOfHand => "sleight-of-hand",
            Skill::Stealth => "stealth",
            Skill::Arcana => "arcana",
            Skill::History => "history",
            Skill::Investigation => "investigation",
            Skill::Nature => "nature",
            Skill::Religion => "religion",
            Skill::AnimalHandling => "animal-handling",
            Skill::Insight => "insight",
            Skill::Medicine => "medicine",
            Skill::Perception => "perception",
            Skill::Survival => "survival",
            Skill::Deception => "deception",
            Skill::Intimidation => "intimidation",
            Skill::Performance => "performance",
            Skill::Persuasion => "persuasion",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    #[default]
    None,
    Half,
    Proficient,
    Expertise,
}

impl ProficiencyLevel {
    /// `floor(proficiency_bonus * multiplier)` for multipliers 0, 0.5, 1, 2.
    pub fn contribution(self, proficiency_bonus: i32) -> i32 {
        match self {
            ProficiencyLevel::None => 0,
            ProficiencyLevel::Half => proficiency_bonus.div_euclid(2),
            ProficiencyLevel::Proficient => proficiency_bonus,
            ProficiencyLevel::Expertise => proficiency_bonus * 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skills_cover_each_ability_except_constitution() {
        let count = |ability| Skill::ALL.iter().filter(|s| s.ability() == ability).count();
        assert_eq!(count(Ability::Strength), 1);
        assert_eq!(count(Ability::Dexterity), 3);
        assert_eq!(count(Ability::Constitution), 0);
        assert_eq!(count(Ability::Intelligence), 5);
        assert_eq!(count(Ability::Wisdom), 5);
        assert_eq!(count(Ability::Charisma), 4);
    }

    #[test]
    fn half_proficiency_is_floored() {
        assert_eq!(ProficiencyLevel::Half.contribution(3), 1);
        assert_eq!(ProficiencyLevel::Half.contribution(2), 1);
        assert_eq!(ProficiencyLevel::Expertise.contribution(3), 6);
        assert_eq!(ProficiencyLevel::None.contribution(6), 0);
    }
}
