use super::Case;
use crate::context::CaseContext;
use crate::error::CaseError;
use tracing::debug;

pub(super) const CASES: &[Case] = &[Case {
    suite: "sub_devices",
    name: "inherit_root_properties",
    description: "sub-devices are non-null and share their root's type and vendor",
    run: inherit_root_properties,
}];

fn inherit_root_properties(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for root in ctx.api.all_devices()? {
        let root_props = ctx.api.device_properties(root)?;
        let subs = ctx.api.sub_devices(root)?;
        debug!(%root, count = subs.len(), "sub-devices");
        for (i, sub) in subs.into_iter().enumerate() {
            ctx.check.require_true(format!("[{root}] sub_device[{i}] is non-null"), !sub.is_null())?;
            let props = ctx.api.device_properties(sub)?;
            ctx.check.expect_eq(format!("[{sub}] type"), root_props.device_type, props.device_type);
            ctx.check.expect_eq(format!("[{sub}] vendor_id"), root_props.vendor_id, props.vendor_id);
        }
    }
    Ok(())
}
