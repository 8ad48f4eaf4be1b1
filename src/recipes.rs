//! Built-in recipes.
//!
//! Each recipe is a plain function returning a fresh [`Recipe`]; nothing is
//! cached or shared between callers.

use crate::constants::{CHEMICAL_ELEMENT_SYMBOLS, INTEGER_PATTERN, targets};
use crate::error::Result;
use crate::models::{NumberKind, TemperatureUnit};
use crate::recipe::Recipe;
use crate::transformers::{
    AutoDummifier, BinaryTransformer, MolecularFormulaTransformer, MultiBinaryDummifier,
    MultiNumberExtractor, MultiTemperatureExtractor, NumberExtractor,
};

/// Names accepted by [`by_name`]
pub const AVAILABLE: &[&str] = &["cathode"];

const SPACE_GROUPS: &[&str] = &[
    "C2/c", "C2/m", "Fd-3m", "Fm-3m", "I4/mmm", "Ia-3", "P-3m1", "P21/c", "P4332", "P63/mmc",
    "Pbcn", "Pm-3m", "Pnma", "R-3c", "R-3m",
];

const PRECURSOR_METHODS: &[&str] = &[
    "Annealing",
    "Atomic layer deposition",
    "Ball milling",
    "CVD",
    "Calcination",
    "Chemical lithiation",
    "Co-precipitation",
    "Combustion synthesis",
    "Commercial",
    "Deposition",
    "Electrochemical",
    "Electrospinning",
    "Grinding",
    "High-shear dry mixing",
    "Hydrolysis",
    "Hydrothermal",
    "Impregnation",
    "Ion exchange reaction",
    "Mechanical mixing",
    "Microwave-assisted",
    "Modified Hummers",
    "Molten salt synthesis",
    "Na-embedded precursor",
    "Nano",
    "Oxalate precipitation",
    "Pechini",
    "Pickering emulsion",
    "Plasma-assisted",
    "Polymer-assisted chemical solution",
    "Pyrolysis",
    "Sintering",
    "Sol-gel",
    "Solid solution",
    "Solid-state reaction",
    "Solvothermal",
    "Spin coating",
    "Spray drying",
    "Spray pyrolysis",
    "Thermal polymerization",
    "Ultrasound-triggered cation chelation",
    "Wet chemistry",
    "Wet mixing",
];

/// Electrolyte solvents, matched as whole words
const SOLVENTS: &[&str] = &[
    "EC",
    "DMC",
    "EMC",
    "DEC",
    "PC",
    "VC",
    "FEC",
    "ACN",
    "THF",
    "DME",
    "DMF",
    "DMSO",
    "NMP",
    "DMAc",
    "MTBE",
    "dioxane",
    "formamide",
    "sulfolane",
    "acetone",
    "methanol",
    "ethanol",
    "isopropanol",
    "butanol",
    "ethyl",
    "methyl",
    "butyl",
    "diethyl",
    "chloroform",
    "dichloromethane",
    "toluene",
    "xylene",
    "benzene",
    "cyclohexane",
    "hexane",
    "heptane",
    "water",
];

/// Look up a built-in recipe by name
pub fn by_name(name: &str) -> Option<Result<Recipe>> {
    match name {
        "cathode" => Some(cathode_recipe()),
        _ => None,
    }
}

/// Cathode-material synthesis and cycling records.
///
/// Covers composition, coating, dopants, structure, precursor synthesis,
/// annealing schedule, cell setup and the three performance targets.
pub fn cathode_recipe() -> Result<Recipe> {
    let mut builder = Recipe::builder();

    builder
        .add(
            "molecular formula",
            "Fraction",
            MolecularFormulaTransformer::new(),
        )?
        .add("coating material", "Coating", AutoDummifier::new())?
        .add(
            "dopant element",
            "Dopant",
            MultiBinaryDummifier::word_bounded(CHEMICAL_ELEMENT_SYMBOLS, false)?,
        )?
        .add(
            "crystal space group",
            "Space",
            MultiBinaryDummifier::literal(SPACE_GROUPS, false)?,
        )?
        .add(
            "primary particle size",
            "Particle Size Primary(nm)",
            NumberExtractor::new()?,
        )?
        .add(
            "secondary particle size",
            "Particle Size Secondary(nm)",
            NumberExtractor::new()?,
        )?
        .add("precursor type", "Precursor Type", AutoDummifier::new())?
        .add(
            "precursor preparation method",
            "Precursor Method",
            MultiBinaryDummifier::literal(PRECURSOR_METHODS, true)?,
        )?;

    builder
        .add(
            "annealing temperature",
            [
                "Annealing Temperature 1(K)",
                "Annealing Temperature 2(K)",
                "Annealing Temperature 3(K)",
            ],
            MultiTemperatureExtractor::new(3)?.convert_to(TemperatureUnit::Kelvin),
        )?
        .add(
            "annealing time",
            [
                "Annealing Time 1(h)",
                "Annealing Time 2(h)",
                "Annealing Time 3(h)",
            ],
            MultiNumberExtractor::new(3)?,
        )?
        .add(
            "single crystal or polycrystalline",
            "is Polycrystalline",
            BinaryTransformer::true_keywords(&["Poly"])?,
        )?
        .add(
            "voltage range",
            ["Minimum Voltage(V)", "Maximum Voltage(V)"],
            MultiNumberExtractor::new(2)?,
        )?
        .add(
            "electrolyte system",
            "Electrolyte LiPF6",
            BinaryTransformer::true_keywords(&["LiPF"])?,
        )?
        .add(
            "electrolyte system",
            "Electrolyte Solvent",
            MultiBinaryDummifier::word_bounded(SOLVENTS, true)?,
        )?
        .add(
            "cycles",
            "Cycles",
            NumberExtractor::with_patterns(&[INTEGER_PATTERN])?
                .kind(NumberKind::Int)
                .round_digits(None),
        )?
        .add("anode material", "Anode", AutoDummifier::new())?;

    // targets
    builder
        .add("capacity", targets::CAPACITY, NumberExtractor::new()?)?
        .add(
            "capacity retention",
            targets::CAPACITY_RETENTION,
            NumberExtractor::percentage()?,
        )?
        .add(
            "first Coulombic efficiency",
            targets::FIRST_COULOMBIC_EFFICIENCY,
            NumberExtractor::percentage()?,
        )?;

    Ok(builder.build())
}
