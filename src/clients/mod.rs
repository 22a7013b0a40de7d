pub mod nutrition;

pub use nutrition::NutritionClient;
