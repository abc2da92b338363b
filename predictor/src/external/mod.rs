//! External collaborators

pub mod disease_detection;

pub use disease_detection::{
    ImageClassifier, ImageInput, PlantDiseaseDetector, RemoteImageClassifier, DEFAULT_CLASS_NAMES,
};
