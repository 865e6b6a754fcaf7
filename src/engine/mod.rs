// tutorchat Engine — Client interaction layer
// Panel geometry, backend transport, chat widget, book sidebar and
// analytics dashboards. Nothing here touches a DOM; hosts render the view
// models (see `render`) and feed pointer events back in.

pub mod geometry;
pub mod panel;
pub mod http;
pub mod backend;
pub mod format;
pub mod dates;
pub mod books;
pub mod widget;
pub mod analytics;
pub mod render;
