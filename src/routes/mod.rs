pub(crate) mod companies;
pub(crate) mod dashboard;
pub(crate) mod health;
pub(crate) mod prices;
