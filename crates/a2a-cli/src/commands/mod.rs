pub mod cancel;
pub mod completion;
pub mod describe;
pub mod get;
pub mod logs;
pub mod replay;
pub mod run;
pub mod serve;
pub mod submit;
