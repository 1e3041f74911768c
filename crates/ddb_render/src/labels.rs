//! Display labels for the two supported table languages.

use std::fmt;
use std::str::FromStr;

use ddb_core::ability::Ability;
use ddb_core::attacks::{AttackMode, WeaponProperty};
use ddb_core::damage::DamageType;
use ddb_core::skills::Skill;
use ddb_core::spells::{ActivationUnit, DurationUnit};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "ko", alias = "korean")]
    Korean,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Korean => "ko",
        }
    }

    pub fn ability(self, ability: Ability) -> &'static str {
        match self {
            Locale::English => match ability {
                Ability::Strength => "Strength",
                Ability::Dexterity => "Dexterity",
                Ability::Constitution => "Constitution",
                Ability::Intelligence => "Intelligence",
                Ability::Wisdom => "Wisdom",
                Ability::Charisma => "Charisma",
            },
            Locale::Korean => match ability {
                Ability::Strength => "근력",
                Ability::Dexterity => "민첩",
                Ability::Constitution => "건강",
                Ability::Intelligence => "지능",
                Ability::Wisdom => "지혜",
                Ability::Charisma => "매력",
            },
        }
    }

    pub fn skill(self, skill: Skill) -> &'static str {
        match self {
            Locale::English => skill.name(),
            Locale::Korean => match skill {
                Skill::Athletics => "운동",
                Skill::Acrobatics => "곡예",
                Skill::SleightOfHand => "손재주",
                Skill::Stealth => "은신",
                Skill::Arcana => "마법학",
                Skill::History => "역사",
                Skill::Investigation => "조사",
                Skill::Nature => "자연",
                Skill::Religion => "종교",
                Skill::AnimalHandling => "동물 조련",
                Skill::Insight => "통찰",
                Skill::Medicine => "의학",
                Skill::Perception => "지각",
                Skill::Survival => "생존",
                Skill::Deception => "기만",
                Skill::Intimidation => "위협",
                Skill::Performance => "공연",
                Skill::Persuasion => "설득",
            },
        }
    }

    /// Unrecognized damage labels are shown as the source spelled them.
    pub fn damage_type<'a>(self, damage_type: &'a DamageType) -> &'a str {
        if self == Locale::English {
            return damage_type.name();
        }
        match damage_type {
            DamageType::Bludgeoning => "타격",
            DamageType::Piercing => "관통",
            DamageType::Slashing => "참격",
            DamageType::Necrotic => "사령",
            DamageType::Acid => "산성",
            DamageType::Cold => "냉기",
            DamageType::Fire => "화염",
            DamageType::Lightning => "번개",
            DamageType::Thunder => "천둥",
            DamageType::Poison => "독",
            DamageType::Psychic => "정신",
            DamageType::Radiant => "광휘",
            DamageType::Force => "역장",
            DamageType::Other(label) => label,
        }
    }

    pub fn weapon_property(self, property: WeaponProperty) -> &'static str {
        match (self, property) {
            (Locale::English, WeaponProperty::Ammunition) => "Ammunition",
            (Locale::English, WeaponProperty::Finesse) => "Finesse",
            (Locale::English, WeaponProperty::Heavy) => "Heavy",
            (Locale::English, WeaponProperty::Light) => "Light",
            (Locale::English, WeaponProperty::Loading) => "Loading",
            (Locale::English, WeaponProperty::Reach) => "Reach",
            (Locale::English, WeaponProperty::Special) => "Special",
            (Locale::English, WeaponProperty::Thrown) => "Thrown",
            (Locale::English, WeaponProperty::TwoHanded) => "Two-Handed",
            (Locale::English, WeaponProperty::Versatile) => "Versatile",
            (Locale::Korean, WeaponProperty::Ammunition) => "탄약",
            (Locale::Korean, WeaponProperty::Finesse) => "기교",
            (Locale::Korean, WeaponProperty::Heavy) => "중량",
            (Locale::Korean, WeaponProperty::Light) => "경량",
            (Locale::Korean, WeaponProperty::Loading) => "장전",
            (Locale::Korean, WeaponProperty::Reach) => "사거리(손 닿는 범위)",
            (Locale::Korean, WeaponProperty::Special) => "특수",
            (Locale::Korean, WeaponProperty::Thrown) => "투척",
            (Locale::Korean, WeaponProperty::TwoHanded) => "양손",
            (Locale::Korean, WeaponProperty::Versatile) => "양손(가변)",
        }
    }

    pub fn attack_mode(self, mode: AttackMode) -> &'static str {
        match (self, mode) {
            (Locale::English, AttackMode::Melee) => "Melee",
            (Locale::English, AttackMode::Ranged) => "Ranged",
            (Locale::English, AttackMode::Thrown) => "Ranged (thrown)",
            (Locale::English, AttackMode::Reach) => "Melee (reach)",
            (Locale::Korean, AttackMode::Melee) => "근접",
            (Locale::Korean, AttackMode::Ranged) => "원거리",
            (Locale::Korean, AttackMode::Thrown) => "원거리(투척)",
            (Locale::Korean, AttackMode::Reach) => "근접(도달)",
        }
    }

    pub fn activation(self, unit: ActivationUnit) -> &'static str {
        match (self, unit) {
            (Locale::English, ActivationUnit::Action) => "action",
            (Locale::English, ActivationUnit::BonusAction) => "bonus action",
            (Locale::English, ActivationUnit::Reaction) => "reaction",
            (Locale::English, ActivationUnit::Minute) => "minute",
            (Locale::English, ActivationUnit::Hour) => "hour",
            (Locale::English, ActivationUnit::Special) => "special",
            (Locale::Korean, ActivationUnit::Action) => "행동",
            (Locale::Korean, ActivationUnit::BonusAction) => "추가 행동",
            (Locale::Korean, ActivationUnit::Reaction) => "반응행동",
            (Locale::Korean, ActivationUnit::Minute) => "분",
            (Locale::Korean, ActivationUnit::Hour) => "시간",
            (Locale::Korean, ActivationUnit::Special) => "특수",
        }
    }

    /// English unit names take an `s` when `amount` is not one.
    pub fn duration_unit(self, unit: DurationUnit, amount: i32) -> String {
        match self {
            Locale::English => {
                let name = match unit {
                    DurationUnit::Round => "round",
                    DurationUnit::Minute => "minute",
                    DurationUnit::Hour => "hour",
                    DurationUnit::Day => "day",
                };
                if amount == 1 {
                    name.to_string()
                } else {
                    format!("{name}s")
                }
            }
            Locale::Korean => match unit {
                DurationUnit::Round => "라운드",
                DurationUnit::Minute => "분",
                DurationUnit::Hour => "시간",
                DurationUnit::Day => "일",
            }
            .to_string(),
        }
    }

    /// Distances in feet, e.g. `"60 ft"` or `"60피트"`.
    pub fn feet(self, feet: i32) -> String {
        match self {
            Locale::English => format!("{feet} ft"),
            Locale::Korean => format!("{feet}피트"),
        }
    }

    pub fn heading(self, heading: Heading) -> &'static str {
        match self {
            Locale::English => match heading {
                Heading::WeaponAttacks => "Weapon Attacks",
                Heading::Spellcasting => "Spellcasting",
                Heading::Spell => "Spell",
                Heading::OtherSpells => "Other Known Spells",
                Heading::Background => "Background",
                Heading::Classes => "Classes",
                Heading::Feats => "Feats",
                Heading::Maneuvers => "Maneuvers",
                Heading::ClassFeatures => "Class Features",
                Heading::Currency => "Currency",
                Heading::Equipped => "Equipped",
                Heading::Carried => "Carried",
                Heading::Class => "Class",
                Heading::Level => "Level",
                Heading::Player => "Player",
            },
            Locale::Korean => match heading {
                Heading::WeaponAttacks => "무기 공격",
                Heading::Spellcasting => "주문 시전",
                Heading::Spell => "주문",
                Heading::OtherSpells => "기타 주문",
                Heading::Background => "배경",
                Heading::Classes => "클래스",
                Heading::Feats => "피트",
                Heading::Maneuvers => "전투 기교",
                Heading::ClassFeatures => "클래스 피쳐",
                Heading::Currency => "소지금",
                Heading::Equipped => "착용 장비",
                Heading::Carried => "소지품",
                Heading::Class => "Class",
                Heading::Level => "Level",
                Heading::Player => "Player",
            },
        }
    }

    pub fn term(self, term: Term) -> &'static str {
        match self {
            Locale::English => match term {
                Term::Initiative => "Initiative",
                Term::Speed => "Speed",
                Term::ProficiencyBonus => "Proficiency Bonus",
                Term::Check => "check",
                Term::Save => "save",
                Term::Damage => "damage",
                Term::Hit => "Hit",
                Term::SpellDamage => "Damage",
                Term::SaveThrow => "Save",
                Term::Effect => "Effect",
                Term::Notes => "Notes",
                Term::Range => "Range",
                Term::Reach => "Reach",
                Term::Properties => "Properties",
                Term::Magic => "Magic",
                Term::CastingTime => "Casting Time",
                Term::Duration => "Duration",
                Term::Instantaneous => "Instantaneous",
                Term::Special => "Special",
                Term::Concentration => "Concentration",
                Term::Ritual => "Ritual",
                Term::Components => "Components",
                Term::Area => "Area",
                Term::SelfRange => "Self",
                Term::Touch => "Touch",
                Term::SpellAbility => "Spell ability",
                Term::Modifier => "mod",
                Term::SpellAttack => "Spell attack",
                Term::SpellSaveDc => "Spell save DC",
                Term::Cantrip => "cantrip",
                Term::SpellLevel => "level",
                Term::Hp => "HP",
                Term::Ac => "AC",
                Term::Saves => "Saving Throws",
                Term::Skills => "Skills",
            },
            Locale::Korean => match term {
                Term::Initiative => "이니셔티브",
                Term::Speed => "이동속도",
                Term::ProficiencyBonus => "숙련보너스",
                Term::Check => "판정",
                Term::Save => "내성",
                Term::Damage => "대미지",
                Term::Hit => "명중",
                Term::SpellDamage => "피해",
                Term::SaveThrow => "내성",
                Term::Effect => "효과",
                Term::Notes => "메모",
                Term::Range => "사거리",
                Term::Reach => "도달거리",
                Term::Properties => "속성",
                Term::Magic => "마법",
                Term::CastingTime => "시전시간",
                Term::Duration => "지속시간",
                Term::Instantaneous => "즉시",
                Term::Special => "특수",
                Term::Concentration => "집중",
                Term::Ritual => "의식",
                Term::Components => "구성요소",
                Term::Area => "대상/범위",
                Term::SelfRange => "자신",
                Term::Touch => "접촉",
                Term::SpellAbility => "주문 능력치",
                Term::Modifier => "수정치",
                Term::SpellAttack => "주문 명중",
                Term::SpellSaveDc => "주문 내성 DC",
                Term::Cantrip => "소마법",
                Term::SpellLevel => "레벨",
                Term::Hp => "HP",
                Term::Ac => "AC",
                Term::Saves => "내성 굴림",
                Term::Skills => "기술",
            },
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown locale `{0}` (expected `en` or `ko`)")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "ko" | "kr" | "korean" => Ok(Locale::Korean),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

/// Bracketed section titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    WeaponAttacks,
    Spellcasting,
    Spell,
    OtherSpells,
    Background,
    Classes,
    Feats,
    Maneuvers,
    ClassFeatures,
    Currency,
    Equipped,
    Carried,
    Class,
    Level,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Initiative,
    Speed,
    ProficiencyBonus,
    Check,
    Save,
    Damage,
    Hit,
    SpellDamage,
    SaveThrow,
    Effect,
    Notes,
    Range,
    Reach,
    Properties,
    Magic,
    CastingTime,
    Duration,
    Instantaneous,
    Special,
    Concentration,
    Ritual,
    Components,
    Area,
    SelfRange,
    Touch,
    SpellAbility,
    Modifier,
    SpellAttack,
    SpellSaveDc,
    Cantrip,
    SpellLevel,
    Hp,
    Ac,
    Saves,
    Skills,
}
