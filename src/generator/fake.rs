//! Override generators: realistic fake data and fixed constants.

use super::{Value, ValueGenerator};
use crate::schema::ColumnType;
use fake::faker::address::en::{CityName, CountryName, StateName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Kind of fake value to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeKind {
    Name,
    FirstName,
    LastName,
    Email,
    Phone,
    Username,
    City,
    State,
    Zip,
    Country,
    Company,
    Word,
    Sentence,
    Paragraph,
    Uuid,
    Ip,
}

impl FakeKind {
    pub const NAMES: &'static str = "name, first_name, last_name, email, phone, username, city, state, zip, country, company, word, sentence, paragraph, uuid, ip";
}

impl std::str::FromStr for FakeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" | "full_name" => Ok(FakeKind::Name),
            "first_name" => Ok(FakeKind::FirstName),
            "last_name" => Ok(FakeKind::LastName),
            "email" | "safe_email" => Ok(FakeKind::Email),
            "phone" | "phone_number" => Ok(FakeKind::Phone),
            "username" | "user_name" => Ok(FakeKind::Username),
            "city" => Ok(FakeKind::City),
            "state" => Ok(FakeKind::State),
            "zip" | "zip_code" | "postal_code" => Ok(FakeKind::Zip),
            "country" => Ok(FakeKind::Country),
            "company" | "company_name" => Ok(FakeKind::Company),
            "word" => Ok(FakeKind::Word),
            "sentence" => Ok(FakeKind::Sentence),
            "paragraph" | "lorem" => Ok(FakeKind::Paragraph),
            "uuid" => Ok(FakeKind::Uuid),
            "ip" | "ip_address" | "ipv4" => Ok(FakeKind::Ip),
            _ => Err(format!(
                "Unknown fake generator: {}. Valid options: {}",
                s,
                FakeKind::NAMES
            )),
        }
    }
}

/// Generator backed by the `fake` crate.
///
/// Values longer than the column's declared size are truncated to fit.
#[derive(Debug, Clone)]
pub struct FakeGenerator {
    kind: FakeKind,
}

impl FakeGenerator {
    pub fn new(kind: FakeKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> FakeKind {
        self.kind
    }

    fn fake_value(&self, rng: &mut dyn RngCore) -> String {
        // Convert rng to StdRng for fake crate compatibility
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        let mut fake_rng = StdRng::from_seed(seed);

        match self.kind {
            FakeKind::Name => Name().fake_with_rng(&mut fake_rng),
            FakeKind::FirstName => FirstName().fake_with_rng(&mut fake_rng),
            FakeKind::LastName => LastName().fake_with_rng(&mut fake_rng),
            FakeKind::Email => SafeEmail().fake_with_rng(&mut fake_rng),
            FakeKind::Phone => PhoneNumber().fake_with_rng(&mut fake_rng),
            FakeKind::Username => Username().fake_with_rng(&mut fake_rng),
            FakeKind::City => CityName().fake_with_rng(&mut fake_rng),
            FakeKind::State => StateName().fake_with_rng(&mut fake_rng),
            FakeKind::Zip => ZipCode().fake_with_rng(&mut fake_rng),
            FakeKind::Country => CountryName().fake_with_rng(&mut fake_rng),
            FakeKind::Company => CompanyName().fake_with_rng(&mut fake_rng),
            FakeKind::Word => Word().fake_with_rng(&mut fake_rng),
            FakeKind::Sentence => Sentence(5..10).fake_with_rng(&mut fake_rng),
            FakeKind::Paragraph => Paragraph(3..5).fake_with_rng(&mut fake_rng),
            FakeKind::Uuid => format!(
                "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
                fake_rng.random::<u32>(),
                fake_rng.random::<u16>(),
                (fake_rng.random::<u16>() & 0x0FFF) | 0x4000, // Version 4
                (fake_rng.random::<u16>() & 0x3FFF) | 0x8000, // Variant
                fake_rng.random::<u64>() & 0xFFFF_FFFF_FFFF_u64
            ),
            FakeKind::Ip => format!(
                "{}.{}.{}.{}",
                fake_rng.random_range(1..255),
                fake_rng.random_range(0..255),
                fake_rng.random_range(0..255),
                fake_rng.random_range(1..255)
            ),
        }
    }
}

impl ValueGenerator for FakeGenerator {
    fn generate(&self, col_type: &ColumnType, rng: &mut dyn RngCore) -> Value {
        let value = self.fake_value(rng);
        match col_type.size {
            Some(size) if size > 0 => value.chars().take(size as usize).collect(),
            _ => value,
        }
    }
}

/// Generator that always returns the same value
#[derive(Debug, Clone)]
pub struct ConstantGenerator {
    value: Value,
}

impl ConstantGenerator {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl ValueGenerator for ConstantGenerator {
    fn generate(&self, _col_type: &ColumnType, _rng: &mut dyn RngCore) -> Value {
        self.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnKind;

    #[test]
    fn test_fake_email() {
        let generator = FakeGenerator::new(FakeKind::Email);
        let mut rng = StdRng::seed_from_u64(42);
        let value = generator.generate(&ColumnType::new(ColumnKind::Text), &mut rng);
        assert!(value.contains('@'));
    }

    #[test]
    fn test_fake_name_has_space() {
        let generator = FakeGenerator::new(FakeKind::Name);
        let mut rng = StdRng::seed_from_u64(42);
        let value = generator.generate(&ColumnType::new(ColumnKind::Text), &mut rng);
        assert!(value.contains(' '));
    }

    #[test]
    fn test_fake_uuid_format() {
        let generator = FakeGenerator::new(FakeKind::Uuid);
        let mut rng = StdRng::seed_from_u64(42);
        let value = generator.generate(&ColumnType::new(ColumnKind::Text), &mut rng);
        assert_eq!(value.len(), 36);
        assert_eq!(value.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn test_fake_truncated_to_size() {
        let generator = FakeGenerator::new(FakeKind::Paragraph);
        let mut rng = StdRng::seed_from_u64(42);
        let value = generator.generate(&ColumnType::new(ColumnKind::Text).with_size(8), &mut rng);
        assert_eq!(value.chars().count(), 8);
    }

    #[test]
    fn test_fake_same_seed_same_value() {
        let generator = FakeGenerator::new(FakeKind::City);
        let col_type = ColumnType::new(ColumnKind::Text);
        let a = generator.generate(&col_type, &mut StdRng::seed_from_u64(3));
        let b = generator.generate(&col_type, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_fake_kind_parsing() {
        assert_eq!("EMAIL".parse::<FakeKind>().unwrap(), FakeKind::Email);
        assert_eq!("zip_code".parse::<FakeKind>().unwrap(), FakeKind::Zip);
        assert!("credit_card".parse::<FakeKind>().is_err());
    }

    #[test]
    fn test_constant() {
        let generator = ConstantGenerator::new("active");
        let mut rng = StdRng::seed_from_u64(0);
        let value = generator.generate(&ColumnType::new(ColumnKind::Int(crate::schema::IntWidth::Big)), &mut rng);
        assert_eq!(value, "active");
    }
}
