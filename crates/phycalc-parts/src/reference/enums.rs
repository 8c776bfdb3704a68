//! Enumerations of the reference family.
//!
//! Each enum is declared once here; [`define_enums`] registers the model
//! side and units convert integer enum values back with `from_value`.

use phycalc_model::{EnumMember, Model, ModelError};

macro_rules! model_enum {
    (
        $(#[$meta:meta])*
        $ty:ident, $model_name:literal, $desc:literal {
            $($variant:ident = $value:literal, $member:literal, $member_desc:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $ty {
            $($variant,)+
        }

        impl $ty {
            pub const MODEL_NAME: &'static str = $model_name;

            pub fn value(self) -> i64 {
                match self {
                    $($ty::$variant => $value,)+
                }
            }

            pub fn member_name(self) -> &'static str {
                match self {
                    $($ty::$variant => $member,)+
                }
            }

            pub fn from_value(value: i64) -> Option<Self> {
                match value {
                    $($value => Some($ty::$variant),)+
                    _ => None,
                }
            }

            fn members() -> Vec<EnumMember> {
                vec![$(EnumMember::new($member, $value, $member_desc),)+]
            }

            fn define(model: &mut Model) -> Result<(), ModelError> {
                model.define_enum($model_name, $desc, Self::members())
            }
        }
    };
}

model_enum! {
    Modulation, "ModulationEnum", "Modulation format" {
        Fsk2 = 0, "FSK2", "Binary FSK";
        Fsk4 = 1, "FSK4", "Four-level FSK";
        Bpsk = 2, "BPSK", "Binary phase shift keying";
        Dbpsk = 3, "DBPSK", "Differential BPSK";
        Oqpsk = 4, "OQPSK", "Offset QPSK";
        Msk = 5, "MSK", "Minimum shift keying";
        Ook = 6, "OOK", "On-off keying";
        Ask = 7, "ASK", "Amplitude shift keying";
    }
}

model_enum! {
    SymbolEncoding, "SymbolEncodingEnum", "Symbol coding applied before modulation" {
        Nrz = 0, "NRZ", "Non-return to zero";
        Manchester = 1, "Manchester", "Manchester coding, two chips per bit";
        Dsss = 2, "DSSS", "Direct sequence spread spectrum";
    }
}

model_enum! {
    ShapingFilter, "ShapingFilterEnum", "TX pulse shaping filter" {
        None = 0, "NONE", "No shaping";
        Gaussian = 1, "Gaussian", "Gaussian filter, parameter is BT";
        CustomOqpsk = 2, "Custom_OQPSK", "Half-sine shaping for OQPSK";
        RaisedCosine = 3, "Raised_Cosine", "Raised cosine, parameter is roll-off";
    }
}

model_enum! {
    BitEndian, "BitEndianEnum", "Bit order on air" {
        LsbFirst = 0, "LSB_FIRST", "Least significant bit first";
        MsbFirst = 1, "MSB_FIRST", "Most significant bit first";
    }
}

impl Modulation {
    pub fn is_fsk(self) -> bool {
        matches!(self, Modulation::Fsk2 | Modulation::Fsk4 | Modulation::Msk)
    }
}

impl ShapingFilter {
    /// Hardware shaping mode; 0 bypasses the filter.
    pub fn mode(self) -> i64 {
        match self {
            ShapingFilter::None => 0,
            ShapingFilter::Gaussian | ShapingFilter::RaisedCosine => 1,
            ShapingFilter::CustomOqpsk => 2,
        }
    }
}

pub fn define_enums(model: &mut Model) -> Result<(), ModelError> {
    Modulation::define(model)?;
    SymbolEncoding::define(model)?;
    ShapingFilter::define(model)?;
    BitEndian::define(model)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip() {
        for v in 0..8 {
            let m = Modulation::from_value(v).unwrap();
            assert_eq!(m.value(), v);
        }
        assert_eq!(Modulation::from_value(8), None);
        assert_eq!(SymbolEncoding::Dsss.member_name(), "DSSS");
    }

    #[test]
    fn enums_registered_in_model() {
        let mut model = Model::new("reference", "A0");
        define_enums(&mut model).unwrap();
        let def = model.enum_def("ShapingFilterEnum").unwrap();
        assert_eq!(def.resolve("Custom_OQPSK"), Some(2));
        // registering again is a no-op
        define_enums(&mut model).unwrap();
        assert_eq!(model.enum_def("ModulationEnum").unwrap().members().len(), 8);
    }
}
