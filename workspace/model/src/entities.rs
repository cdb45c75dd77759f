//! Root of the SeaORM entity modules of the book catalog.

pub mod author;
pub mod book;
pub mod comment;
pub mod editor;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::author::Entity as Author;
    pub use super::book::Entity as Book;
    pub use super::comment::Entity as Comment;
    pub use super::editor::Entity as Editor;
    pub use super::user::Entity as User;
}
