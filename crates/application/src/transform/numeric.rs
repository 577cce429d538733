use domain::{CommandValue, DomainError, PropertyValue, ResourceOperation, Result};
use tracing::debug;

fn parse_param(name: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|e| {
        DomainError::TransformParseError(format!("invalid {} parameter {:?}: {}", name, raw, e))
    })
}

/// Normalizes a raw driver value in place: `base^v`, then `* scale`, then
/// `+ offset`.
///
/// Unset steps are skipped. With no step configured the value is not parsed,
/// so bool and string values pass through. On error `value` is untouched.
pub fn transform_read_value(pv: &PropertyValue, value: &mut CommandValue) -> Result<()> {
    if !pv.has_numeric_transform() {
        return Ok(());
    }

    let raw = value.to_f64()?;
    let mut v = raw;
    if !pv.base.is_empty() {
        v = parse_param("base", &pv.base)?.powf(v);
    }
    if !pv.scale.is_empty() {
        v *= parse_param("scale", &pv.scale)?;
    }
    if !pv.offset.is_empty() {
        v += parse_param("offset", &pv.offset)?;
    }

    value.replace_from_f64(v)?;
    debug!(resource = %value.resource(), input = %raw, result = %v, "Read transform applied");
    Ok(())
}

/// Inverse of [`transform_read_value`] for outbound parameters: `- offset`,
/// then `/ scale`, then `log_base`.
///
/// A zero scale is rejected with `InvalidParameter` and leaves `value`
/// untouched.
pub fn transform_write_value(pv: &PropertyValue, value: &mut CommandValue) -> Result<()> {
    if !pv.has_numeric_transform() {
        return Ok(());
    }

    let raw = value.to_f64()?;
    let mut v = raw;
    if !pv.offset.is_empty() {
        v -= parse_param("offset", &pv.offset)?;
    }
    if !pv.scale.is_empty() {
        let scale = parse_param("scale", &pv.scale)?;
        if scale == 0.0 {
            return Err(DomainError::InvalidParameter(format!(
                "scale of {} is zero, cannot invert",
                value.resource()
            )));
        }
        v /= scale;
    }
    if !pv.base.is_empty() {
        let base = parse_param("base", &pv.base)?;
        if base <= 0.0 || base == 1.0 {
            return Err(DomainError::InvalidParameter(format!(
                "base {} of {} has no logarithm",
                base,
                value.resource()
            )));
        }
        v = v.log(base);
    }

    value.replace_from_f64(v)?;
    debug!(resource = %value.resource(), input = %raw, result = %v, "Write transform applied");
    Ok(())
}

/// Fails when an assertion is configured and the rendering differs from it.
pub fn check_assertion(pv: &PropertyValue, value: &CommandValue) -> Result<()> {
    if pv.assertion.is_empty() {
        return Ok(());
    }
    let actual = value.to_string();
    if actual != pv.assertion {
        return Err(DomainError::AssertionFailed {
            expected: pv.assertion.clone(),
            actual,
        });
    }
    Ok(())
}

/// Replaces the value through the operation's mapping table, if it has one.
///
/// A hit yields a string value with the same resource and origin.
pub fn map_value(ro: &ResourceOperation, value: CommandValue) -> Result<CommandValue> {
    if ro.mappings.is_empty() {
        return Ok(value);
    }
    let rendered = value.to_string();
    match ro.mappings.get(&rendered) {
        Some(mapped) => Ok(CommandValue::new_string(
            value.resource(),
            value.origin(),
            mapped.as_str(),
        )),
        None => Err(DomainError::MappingNotFound(rendered)),
    }
}
