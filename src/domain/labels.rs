//! Vehicle label vocabulary shared by the dataset descriptor and the detector.

/// Ordered class names. The index of each entry is the model's class id.
pub const VEHICLE_CLASSES: [&str; 11] = [
    "armored_personnel_carrier",
    "artillery",
    "car",
    "commercial_vehicle",
    "heavy_vehicle",
    "infantry_fighting_vehicle",
    "military_jeep",
    "military_truck",
    "motorcycle",
    "tank",
    "tractor",
];

pub fn num_classes() -> usize {
    VEHICLE_CLASSES.len()
}

/// Human readable label for a class id, `class_<id>` when the id is out of range.
pub fn label_for(class_id: usize) -> String {
    VEHICLE_CLASSES
        .get(class_id)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("class_{}", class_id))
}

pub fn class_names() -> Vec<String> {
    VEHICLE_CLASSES.iter().map(|s| s.to_string()).collect()
}
