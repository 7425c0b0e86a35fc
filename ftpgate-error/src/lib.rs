pub mod ext;
pub mod status_code;
pub mod types;

// Публичный реэкспорт всех типов ошибок, чтобы внешний код не зависел от
// внутренней раскладки модулей.
pub use ext::*;
pub use status_code::*;
pub use types::*;
