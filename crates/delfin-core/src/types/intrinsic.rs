//! Built-in type names of the System unit

use crate::symbol::canonicalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicType {
    ShortInt,
    SmallInt,
    Integer,
    Int64,
    Byte,
    Word,
    Cardinal,
    UInt64,
    NativeInt,
    NativeUInt,
    LongInt,
    LongWord,
    Single,
    Double,
    Extended,
    Real,
    Real48,
    Comp,
    Currency,
    Boolean,
    ByteBool,
    WordBool,
    LongBool,
    AnsiChar,
    WideChar,
    Char,
    ShortString,
    AnsiString,
    UnicodeString,
    WideString,
    String,
    Variant,
    OleVariant,
    Pointer,
    PChar,
    PAnsiChar,
    PWideChar,
    PByte,
}

impl IntrinsicType {
    pub const ALL: [IntrinsicType; 38] = [
        IntrinsicType::ShortInt,
        IntrinsicType::SmallInt,
        IntrinsicType::Integer,
        IntrinsicType::Int64,
        IntrinsicType::Byte,
        IntrinsicType::Word,
        IntrinsicType::Cardinal,
        IntrinsicType::UInt64,
        IntrinsicType::NativeInt,
        IntrinsicType::NativeUInt,
        IntrinsicType::LongInt,
        IntrinsicType::LongWord,
        IntrinsicType::Single,
        IntrinsicType::Double,
        IntrinsicType::Extended,
        IntrinsicType::Real,
        IntrinsicType::Real48,
        IntrinsicType::Comp,
        IntrinsicType::Currency,
        IntrinsicType::Boolean,
        IntrinsicType::ByteBool,
        IntrinsicType::WordBool,
        IntrinsicType::LongBool,
        IntrinsicType::AnsiChar,
        IntrinsicType::WideChar,
        IntrinsicType::Char,
        IntrinsicType::ShortString,
        IntrinsicType::AnsiString,
        IntrinsicType::UnicodeString,
        IntrinsicType::WideString,
        IntrinsicType::String,
        IntrinsicType::Variant,
        IntrinsicType::OleVariant,
        IntrinsicType::Pointer,
        IntrinsicType::PChar,
        IntrinsicType::PAnsiChar,
        IntrinsicType::PWideChar,
        IntrinsicType::PByte,
    ];

    pub fn image(&self) -> &'static str {
        match self {
            IntrinsicType::ShortInt => "ShortInt",
            IntrinsicType::SmallInt => "SmallInt",
            IntrinsicType::Integer => "Integer",
            IntrinsicType::Int64 => "Int64",
            IntrinsicType::Byte => "Byte",
            IntrinsicType::Word => "Word",
            IntrinsicType::Cardinal => "Cardinal",
            IntrinsicType::UInt64 => "UInt64",
            IntrinsicType::NativeInt => "NativeInt",
            IntrinsicType::NativeUInt => "NativeUInt",
            IntrinsicType::LongInt => "LongInt",
            IntrinsicType::LongWord => "LongWord",
            IntrinsicType::Single => "Single",
            IntrinsicType::Double => "Double",
            IntrinsicType::Extended => "Extended",
            IntrinsicType::Real => "Real",
            IntrinsicType::Real48 => "Real48",
            IntrinsicType::Comp => "Comp",
            IntrinsicType::Currency => "Currency",
            IntrinsicType::Boolean => "Boolean",
            IntrinsicType::ByteBool => "ByteBool",
            IntrinsicType::WordBool => "WordBool",
            IntrinsicType::LongBool => "LongBool",
            IntrinsicType::AnsiChar => "AnsiChar",
            IntrinsicType::WideChar => "WideChar",
            IntrinsicType::Char => "Char",
            IntrinsicType::ShortString => "ShortString",
            IntrinsicType::AnsiString => "AnsiString",
            IntrinsicType::UnicodeString => "UnicodeString",
            IntrinsicType::WideString => "WideString",
            IntrinsicType::String => "String",
            IntrinsicType::Variant => "Variant",
            IntrinsicType::OleVariant => "OleVariant",
            IntrinsicType::Pointer => "Pointer",
            IntrinsicType::PChar => "PChar",
            IntrinsicType::PAnsiChar => "PAnsiChar",
            IntrinsicType::PWideChar => "PWideChar",
            IntrinsicType::PByte => "PByte",
        }
    }

    pub fn from_name(name: &str) -> Option<IntrinsicType> {
        let name = canonicalize(name);
        Self::ALL
            .into_iter()
            .find(|intrinsic| canonicalize(intrinsic.image()) == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(IntrinsicType::from_name("integer"), Some(IntrinsicType::Integer));
        assert_eq!(IntrinsicType::from_name("PCHAR"), Some(IntrinsicType::PChar));
        assert_eq!(IntrinsicType::from_name("TObject"), None);
    }

    #[test]
    fn every_intrinsic_round_trips_through_its_image() {
        for intrinsic in IntrinsicType::ALL {
            assert_eq!(IntrinsicType::from_name(intrinsic.image()), Some(intrinsic));
        }
    }
}
