//! Onboarding test cases. They share the NM role-token pass.

use super::default::{Batch, run};
use super::nm::resolve_tokens;
use super::{GenContext, ParamSet};
use crate::error::Result;
use crate::template::TestTemplate;

pub fn gen_onbrd(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let mut batch = Batch::from_template(template);
    resolve_tokens(&ctx.roles(), &mut batch)?;
    run(ctx, template, batch)
}
