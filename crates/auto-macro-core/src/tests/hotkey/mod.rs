mod chord;
mod dispatch;
mod table;
