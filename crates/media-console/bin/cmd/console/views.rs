pub(crate) mod bottom_bar;
pub(crate) mod inspect;
pub(crate) mod logs;
pub(crate) mod main_view;
pub(crate) mod queue;
pub(crate) mod status;
